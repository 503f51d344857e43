//! Receipt normalization: defaults, monetary reconciliation and
//! multi-turn context merge.

use rust_decimal::Decimal;
use tracing::debug;

use crate::fallback::{self, GENERIC_ITEM_NAME, PLACEHOLDER_ITEM_NAME};
use crate::types::{
    EngineSettings, PaymentKind, PaymentSplit, ReceiptDraft, TaxClass, AMOUNT_TOLERANCE,
};

/// Email values that mean "nobody actually entered an address".
pub const PLACEHOLDER_EMAILS: &[&str] = &[
    "customer@example.com",
    "client@example.com",
    "user@example.com",
    "test@example.com",
    "example@example.com",
];

/// Merchant-field values that mean "setting was never filled in".
const PLACEHOLDER_MERCHANT_VALUES: &[&str] = &["example.com", "0000000000", "-"];

/// True for an email that is absent-in-spirit.
pub fn is_placeholder_email(email: &str) -> bool {
    PLACEHOLDER_EMAILS
        .iter()
        .any(|p| p.eq_ignore_ascii_case(email.trim()))
}

fn is_placeholder_merchant_value(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || PLACEHOLDER_MERCHANT_VALUES.contains(&trimmed)
}

fn is_generic_item_name(name: &str) -> bool {
    let lower = name.trim().to_lowercase();
    lower == GENERIC_ITEM_NAME.to_lowercase() || lower == PLACEHOLDER_ITEM_NAME.to_lowercase()
}

/// Merge a freshly extracted draft over the prior incomplete one.
///
/// Only meaningfully-new values overwrite: a placeholder email or a
/// generic first item keeps whatever the prior turn already had.
pub fn merge_with_previous(new: ReceiptDraft, previous: &ReceiptDraft) -> ReceiptDraft {
    let mut merged = previous.clone();

    let new_items_meaningful = new
        .items
        .first()
        .map(|i| !is_generic_item_name(&i.name))
        .unwrap_or(false);
    if new_items_meaningful || merged.items.is_empty() {
        merged.items = new.items;
    }

    if !new.payments.is_empty() {
        merged.payments = new.payments;
    }

    if let Some(email) = new.client.email {
        if !is_placeholder_email(&email) {
            merged.client.email = Some(email);
        }
    }
    if new.client.phone.is_some() {
        merged.client.phone = new.client.phone;
    }

    merged.operation = new.operation;
    merged.needs_review = false;
    merged
}

/// Apply defaults, reconcile totals and stamp merchant context.
///
/// `text` is the raw user message, used for payment-method keyword
/// detection.
pub fn normalize(mut draft: ReceiptDraft, text: &str, settings: &EngineSettings) -> ReceiptDraft {
    // Merchant context comes from settings, never from model output.
    // Placeholder sentinel values do not overwrite existing fields.
    let context = settings.merchant_context();
    if !is_placeholder_merchant_value(&context.inn) {
        draft.merchant.inn = context.inn;
    }
    draft.merchant.sno = context.sno;
    if !is_placeholder_merchant_value(&context.company_email) {
        draft.merchant.company_email = context.company_email;
    }
    if !is_placeholder_merchant_value(&context.payment_address) {
        draft.merchant.payment_address = context.payment_address;
    }

    let default_vat = settings.default_vat.unwrap_or_default();
    for item in &mut draft.items {
        if item.tax_class == TaxClass::None {
            item.tax_class = default_vat;
        }
    }

    // Buyer email falls back to the merchant's contact address.
    if draft.client.email.is_none() && !draft.merchant.company_email.trim().is_empty() {
        draft.client.email = Some(draft.merchant.company_email.clone());
    }

    let items_total = draft.items_total();

    if draft.payments.is_empty() {
        let kind = fallback::detect_payment_kind(text).unwrap_or(PaymentKind::Card);
        draft.payments.push(PaymentSplit {
            kind,
            amount: items_total,
        });
        return draft;
    }

    let payments_total = draft.payments_total();
    let delta = (items_total - payments_total).abs();
    if delta <= AMOUNT_TOLERANCE {
        return draft;
    }

    if draft.items.len() == 1 {
        // One item, explicit payments: the payments side is what the
        // user actually said, so back-solve the item price. Prices are
        // whole kopecks, so a quantity that does not divide the sum
        // evenly cannot be reconciled; that goes to review instead of
        // shipping an unbalanced draft.
        let item = &mut draft.items[0];
        if item.quantity > Decimal::ZERO {
            let candidate = (payments_total / item.quantity).round_dp(2);
            if (candidate * item.quantity - payments_total).abs() <= AMOUNT_TOLERANCE {
                item.unit_price = candidate;
                debug!(total = %payments_total, "back-solved single item price from payments");
            } else {
                draft.needs_review = true;
                debug!(
                    total = %payments_total,
                    quantity = %item.quantity,
                    "payment sum not divisible by quantity, flagged for review"
                );
            }
        }
    } else {
        // Multi-item mismatch: the payment sum stays authoritative for
        // the receipt total; item detail is left for operator review.
        draft.needs_review = true;
        debug!(items = %items_total, payments = %payments_total, "total mismatch flagged for review");
    }

    draft
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ClientInfo, LineItem};
    use rust_decimal_macros::dec;

    fn settings() -> EngineSettings {
        EngineSettings {
            inn: "7701234567".into(),
            company_email: "shop@firm.ru".into(),
            payment_address: "shop.ru".into(),
            default_vat: None,
            ..Default::default()
        }
    }

    fn draft_with_items(items: Vec<LineItem>) -> ReceiptDraft {
        ReceiptDraft {
            items,
            ..Default::default()
        }
    }

    #[test]
    fn synthesizes_single_payment_for_full_total() {
        let draft = draft_with_items(vec![
            LineItem::new("кофе", dec!(200)),
            LineItem::new("булка", dec!(50)),
        ]);
        let normalized = normalize(draft, "кофе 200 и булка 50", &settings());
        assert_eq!(normalized.payments.len(), 1);
        assert_eq!(normalized.payments[0].amount, dec!(250));
        assert_eq!(normalized.payments[0].kind, PaymentKind::Card);
        assert!(normalized.is_balanced());
    }

    #[test]
    fn payment_kind_comes_from_text_keyword() {
        let draft = draft_with_items(vec![LineItem::new("кофе", dec!(200))]);
        let normalized = normalize(draft, "кофе 200 наличными", &settings());
        assert_eq!(normalized.payments[0].kind, PaymentKind::Cash);
    }

    #[test]
    fn single_item_price_back_solved_from_payments() {
        let mut draft = draft_with_items(vec![LineItem::new("кофе", dec!(200))]);
        draft.payments = vec![PaymentSplit {
            kind: PaymentKind::Card,
            amount: dec!(350),
        }];
        let normalized = normalize(draft, "кофе", &settings());
        assert_eq!(normalized.items[0].unit_price, dec!(350));
        assert!(normalized.is_balanced());
        assert!(!normalized.needs_review);
    }

    #[test]
    fn uneven_quantity_is_flagged_instead_of_drifting() {
        // 100 / 7 rounds to 14.29; 14.29 x 7 = 100.03, past tolerance.
        let mut item = LineItem::new("пирожок", dec!(10));
        item.quantity = dec!(7);
        let mut draft = draft_with_items(vec![item]);
        draft.payments = vec![PaymentSplit {
            kind: PaymentKind::Card,
            amount: dec!(100),
        }];
        let normalized = normalize(draft, "семь пирожков за сто", &settings());
        assert!(normalized.needs_review);
        assert_eq!(normalized.items[0].unit_price, dec!(10));
        assert_eq!(normalized.payments_total(), dec!(100));
    }

    #[test]
    fn rounding_within_tolerance_still_back_solves() {
        // 100 / 3 rounds to 33.33; 33.33 x 3 = 99.99, within 0.01.
        let mut item = LineItem::new("кофе", dec!(10));
        item.quantity = dec!(3);
        let mut draft = draft_with_items(vec![item]);
        draft.payments = vec![PaymentSplit {
            kind: PaymentKind::Card,
            amount: dec!(100),
        }];
        let normalized = normalize(draft, "три кофе за сто", &settings());
        assert!(!normalized.needs_review);
        assert_eq!(normalized.items[0].unit_price, dec!(33.33));
        assert!(normalized.is_balanced());
    }

    #[test]
    fn multi_item_mismatch_is_flagged_not_averaged() {
        let mut draft = draft_with_items(vec![
            LineItem::new("кофе", dec!(200)),
            LineItem::new("булка", dec!(50)),
        ]);
        draft.payments = vec![PaymentSplit {
            kind: PaymentKind::Cash,
            amount: dec!(300),
        }];
        let normalized = normalize(draft, "кофе и булка", &settings());
        assert!(normalized.needs_review);
        // Item detail untouched.
        assert_eq!(normalized.items[0].unit_price, dec!(200));
        assert_eq!(normalized.payments_total(), dec!(300));
    }

    #[test]
    fn merchant_email_becomes_default_buyer_email() {
        let draft = draft_with_items(vec![LineItem::new("кофе", dec!(200))]);
        let normalized = normalize(draft, "кофе 200", &settings());
        assert_eq!(normalized.client.email.as_deref(), Some("shop@firm.ru"));
    }

    #[test]
    fn default_vat_fills_unset_items() {
        let draft = draft_with_items(vec![LineItem::new("кофе", dec!(200))]);
        let mut s = settings();
        s.default_vat = Some(TaxClass::Vat20);
        let normalized = normalize(draft, "кофе 200", &s);
        assert_eq!(normalized.items[0].tax_class, TaxClass::Vat20);
    }

    #[test]
    fn merge_keeps_prior_items_when_new_is_generic() {
        let previous = draft_with_items(vec![LineItem::new("консультация", dec!(5000))]);
        let new = draft_with_items(vec![LineItem::new(PLACEHOLDER_ITEM_NAME, dec!(100))]);
        let merged = merge_with_previous(new, &previous);
        assert_eq!(merged.items[0].name, "консультация");
    }

    #[test]
    fn merge_takes_new_email_but_not_placeholder() {
        let previous = ReceiptDraft {
            client: ClientInfo {
                email: Some("real@mail.ru".into()),
                phone: None,
            },
            ..Default::default()
        };
        let placeholder = ReceiptDraft {
            client: ClientInfo {
                email: Some("customer@example.com".into()),
                phone: None,
            },
            ..Default::default()
        };
        let merged = merge_with_previous(placeholder, &previous);
        assert_eq!(merged.client.email.as_deref(), Some("real@mail.ru"));

        let fresh = ReceiptDraft {
            client: ClientInfo {
                email: Some("new@mail.ru".into()),
                phone: None,
            },
            ..Default::default()
        };
        let merged = merge_with_previous(fresh, &previous);
        assert_eq!(merged.client.email.as_deref(), Some("new@mail.ru"));
    }
}
