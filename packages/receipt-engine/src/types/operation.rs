//! Fiscal operation types and keyword inference.

use serde::{Deserialize, Serialize};

/// Kind of fiscal document to issue.
///
/// Maps one-to-one onto gateway endpoint paths. `refund` is accepted
/// as a deserialization alias for `sell_refund` (legacy client
/// contract).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    #[default]
    Sell,
    #[serde(alias = "refund")]
    SellRefund,
    SellCorrection,
    RefundCorrection,
}

impl OperationType {
    /// Gateway endpoint path segment for this operation.
    pub fn endpoint(self) -> &'static str {
        match self {
            OperationType::Sell => "sell",
            OperationType::SellRefund => "sell_refund",
            OperationType::SellCorrection => "sell_correction",
            OperationType::RefundCorrection => "sell_refund_correction",
        }
    }

    /// Human-readable Russian name, shown in chat responses.
    pub fn display_name(self) -> &'static str {
        match self {
            OperationType::Sell => "Продажа",
            OperationType::SellRefund => "Возврат",
            OperationType::SellCorrection => "Коррекция прихода",
            OperationType::RefundCorrection => "Коррекция расхода",
        }
    }

    /// Infer the operation from text keywords, unless an explicit hint
    /// was supplied by the caller.
    pub fn infer(text: &str, hint: Option<OperationType>) -> OperationType {
        if let Some(explicit) = hint {
            return explicit;
        }
        let lower = text.to_lowercase();
        let correction = lower.contains("коррекц");
        let refund = lower.contains("возврат") || lower.contains("верни");
        match (correction, refund) {
            (true, true) => OperationType::RefundCorrection,
            (true, false) => OperationType::SellCorrection,
            (false, true) => OperationType::SellRefund,
            (false, false) => OperationType::Sell,
        }
    }
}
