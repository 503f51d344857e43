//! Validation gate: last stop before any external submission.
//!
//! Every rejection here is a structured, user-facing message naming
//! the missing field or condition; none of them trigger retries.

use rust_decimal::Decimal;

use crate::commands::MAX_BULK_COPIES;
use crate::error::{EngineError, Result};
use crate::normalize::is_placeholder_email;
use crate::types::ReceiptDraft;

/// Minimal structural email check: an "@" with something before it
/// and a dot somewhere after it. Full RFC validation is the
/// gateway's problem.
pub fn is_plausible_email(email: &str) -> bool {
    let trimmed = email.trim();
    match trimmed.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.len() >= 3
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

/// Check a bulk-repeat count against the ceiling, before any lookup.
pub fn check_bulk_count(requested: u32) -> Result<()> {
    if requested == 0 || requested > MAX_BULK_COPIES {
        return Err(EngineError::BulkLimitExceeded {
            requested,
            max: MAX_BULK_COPIES,
        });
    }
    Ok(())
}

/// Validate a normalized draft ahead of a real (non-preview)
/// submission.
pub fn check_draft(draft: &ReceiptDraft) -> Result<()> {
    if draft.items.is_empty() {
        return Err(EngineError::missing(
            "price",
            "Не удалось распознать товары. Опиши товар и цену, например: «кофе 200 рублей».",
        ));
    }

    if draft.items.iter().any(|i| i.quantity <= Decimal::ZERO) {
        return Err(EngineError::missing(
            "quantity",
            "Количество товара должно быть больше нуля.",
        ));
    }

    if draft.items.iter().any(|i| i.unit_price < Decimal::ZERO) {
        return Err(EngineError::missing("price", "Цена не может быть отрицательной."));
    }

    match draft.client.email.as_deref() {
        None => Err(EngineError::missing(
            "email",
            "Не указан email покупателя. Добавь почту в сообщение или укажи email компании в настройках.",
        )),
        Some(email) if is_placeholder_email(email) => Err(EngineError::missing(
            "email",
            "Не указан email покупателя. Добавь почту в сообщение или укажи email компании в настройках.",
        )),
        Some(email) if !is_plausible_email(email) => Err(EngineError::missing(
            "email",
            format!("Похоже, «{email}» — не настоящий адрес почты. Проверь email."),
        )),
        Some(_) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback;
    use crate::types::LineItem;
    use rust_decimal_macros::dec;

    fn valid_draft() -> ReceiptDraft {
        let mut draft = ReceiptDraft {
            items: vec![LineItem::new("кофе", dec!(200))],
            ..Default::default()
        };
        draft.client.email = Some("ivan@mail.ru".into());
        draft
    }

    #[test]
    fn valid_draft_passes() {
        assert!(check_draft(&valid_draft()).is_ok());
    }

    #[test]
    fn missing_email_names_the_field() {
        let mut draft = valid_draft();
        draft.client.email = None;
        let err = check_draft(&draft).unwrap_err();
        assert!(matches!(err, EngineError::Validation { field: "email", .. }));
    }

    #[test]
    fn placeholder_email_is_missing() {
        let mut draft = valid_draft();
        draft.client.email = Some("customer@example.com".into());
        assert!(check_draft(&draft).is_err());
    }

    #[test]
    fn structural_email_check() {
        assert!(is_plausible_email("a@b.ru"));
        assert!(!is_plausible_email("no-at-sign"));
        assert!(!is_plausible_email("@mail.ru"));
        assert!(!is_plausible_email("a@nodot"));
        assert!(!is_plausible_email("a@.ru"));
    }

    #[test]
    fn bulk_ceiling_is_fifty() {
        assert!(check_bulk_count(50).is_ok());
        assert!(matches!(
            check_bulk_count(100),
            Err(EngineError::BulkLimitExceeded { requested: 100, max: 50 })
        ));
        assert!(check_bulk_count(0).is_err());
    }

    #[test]
    fn fallback_output_round_trips_through_gate() {
        // A draft the deterministic parser produced must never be
        // rejected for structure it itself created.
        let mut draft = fallback::extract("кофе 200 рублей").unwrap();
        draft.client.email = Some("buyer@mail.ru".into());
        assert!(check_draft(&draft).is_ok());
    }
}
