//! The ledger row: one persisted record per submission attempt.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::draft::ReceiptDraft;
use super::operation::OperationType;

/// Outcome of a submission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceiptStatus {
    Success,
    Failed,
}

impl ReceiptStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ReceiptStatus::Success => "success",
            ReceiptStatus::Failed => "failed",
        }
    }
}

/// One ledger row, keyed by the idempotency identifier.
///
/// On upsert conflicts the externally-observed result (status, demo
/// flag, gateway uuid, permalink) is updated while the original
/// request text and draft stay as first written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedReceipt {
    /// Deterministic idempotency key (or caller-supplied id).
    pub external_id: String,

    /// Raw user text this receipt was produced from.
    pub user_message: String,

    pub operation: OperationType,

    /// Full draft as submitted (items, payments, client).
    pub draft: ReceiptDraft,

    pub total: Decimal,

    pub status: ReceiptStatus,

    /// True when the receipt was not actually issued (missing
    /// credentials or gateway failure).
    pub demo: bool,

    /// Receipt uuid assigned by the gateway, when issued.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,

    /// Public check link for the issued receipt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permalink: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl PersistedReceipt {
    /// Row for a fresh attempt, before the gateway outcome is known.
    pub fn new(
        external_id: impl Into<String>,
        user_message: impl Into<String>,
        draft: ReceiptDraft,
    ) -> Self {
        let total = draft.payments_total();
        Self {
            external_id: external_id.into(),
            user_message: user_message.into(),
            operation: draft.operation,
            draft,
            total,
            status: ReceiptStatus::Failed,
            demo: true,
            uuid: None,
            permalink: None,
            created_at: Utc::now(),
        }
    }
}
