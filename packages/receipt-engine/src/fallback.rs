//! Deterministic fallback extractor.
//!
//! Regex-based parsing used whenever no completion provider is
//! configured or the model strategy produced nothing usable. This
//! stage never fails to produce a draft: worst case it synthesizes a
//! default-priced placeholder item and lets the validation gate
//! decide whether a usable price was actually required.

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;

use crate::error::{EngineError, Result};
use crate::intent::{self, REFUSAL_MESSAGE};
use crate::types::{ClientInfo, LineItem, PaymentKind, ReceiptDraft};

/// Generic names produced by this extractor; the context merge treats
/// them as placeholders that newer drafts may overwrite.
pub const GENERIC_ITEM_NAME: &str = "Товар";
pub const PLACEHOLDER_ITEM_NAME: &str = "Товар по умолчанию";

/// Price used for the synthesized placeholder item.
const PLACEHOLDER_PRICE: u32 = 100;

/// Command stopwords stripped from the front of extracted item names.
const NAME_STOPWORDS: &[&str] = &[
    "создай", "сделай", "пробей", "выбей", "оформи", "чек", "на", "за", "продай",
    "продажа", "возврат", "верни", "и", "плюс", "ещё", "еще",
];

lazy_static! {
    static ref EMAIL: Regex =
        Regex::new(r"[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}").unwrap();

    static ref PHONE: Regex =
        Regex::new(r"(?:\+7|8)[\s\-]?\(?\d{3}\)?[\s\-]?\d{3}[\s\-]?\d{2}[\s\-]?\d{2}").unwrap();

    /// `<words> <number> <currency token>` -> (name, price).
    static ref ITEM_PRICE: Regex = Regex::new(
        r"(?i)([\p{L}][\p{L}\d\s\-]*?)\s+(\d+(?:[.,]\d{1,2})?)\s*(?:руб(?:л[а-яё]*)?\b|₽|р\b\.?)"
    )
    .unwrap();

    /// A number with a currency token but no preceding name.
    static ref BARE_PRICE: Regex =
        Regex::new(r"(?i)(\d+(?:[.,]\d{1,2})?)\s*(?:руб(?:л[а-яё]*)?\b|₽|р\b\.?)").unwrap();

    /// Any price-looking number.
    static ref ANY_NUMBER: Regex = Regex::new(r"\d+(?:[.,]\d{1,2})?").unwrap();
}

/// Parse a price token, tolerating a decimal comma.
fn parse_price(token: &str) -> Option<Decimal> {
    token.replace(',', ".").parse().ok()
}

/// Strip leading command stopwords from an item name.
fn clean_name(raw: &str) -> String {
    let mut tokens: Vec<&str> = raw.split_whitespace().collect();
    while let Some(first) = tokens.first() {
        if NAME_STOPWORDS.contains(&first.to_lowercase().as_str()) {
            tokens.remove(0);
        } else {
            break;
        }
    }
    tokens.join(" ")
}

/// Payment-method keyword detection, shared with the normalizer.
pub fn detect_payment_kind(text: &str) -> Option<PaymentKind> {
    let lower = text.to_lowercase();
    if lower.contains("налич") {
        Some(PaymentKind::Cash)
    } else if lower.contains("карт") || lower.contains("безнал") {
        Some(PaymentKind::Card)
    } else if lower.contains("аванс") || lower.contains("предоплат") {
        Some(PaymentKind::Advance)
    } else if lower.contains("кредит") || lower.contains("рассрочк") {
        Some(PaymentKind::Credit)
    } else {
        None
    }
}

/// Extract a draft from raw text.
///
/// The only failure mode is the domain refusal: greeting text can
/// reach this stage when an active multi-turn context bypassed the
/// intent filter.
pub fn extract(text: &str) -> Result<ReceiptDraft> {
    if intent::is_off_topic(text) && !intent::has_domain_signal(text) {
        return Err(EngineError::Refusal(REFUSAL_MESSAGE.to_string()));
    }

    let email = EMAIL.find(text).map(|m| m.as_str().to_string());
    let phone = PHONE.find(text).map(|m| m.as_str().to_string());

    // Remove contacts so their digits don't read as prices.
    let mut working = EMAIL.replace_all(text, " ").into_owned();
    working = PHONE.replace_all(&working, " ").into_owned();

    let mut items: Vec<LineItem> = ITEM_PRICE
        .captures_iter(&working)
        .filter_map(|caps| {
            let price = parse_price(&caps[2])?;
            let name = clean_name(&caps[1]);
            let name = if name.is_empty() {
                GENERIC_ITEM_NAME.to_string()
            } else {
                name
            };
            Some(LineItem::new(name, price))
        })
        .collect();

    if items.is_empty() {
        items = BARE_PRICE
            .captures_iter(&working)
            .filter_map(|caps| parse_price(&caps[1]))
            .map(|price| LineItem::new(GENERIC_ITEM_NAME, price))
            .collect();
    }

    if items.is_empty() {
        if let Some(m) = ANY_NUMBER.find(&working) {
            if let Some(price) = parse_price(m.as_str()) {
                items.push(LineItem::new(GENERIC_ITEM_NAME, price));
            }
        }
    }

    if items.is_empty() {
        items.push(LineItem::new(
            PLACEHOLDER_ITEM_NAME,
            Decimal::from(PLACEHOLDER_PRICE),
        ));
    }

    Ok(ReceiptDraft {
        items,
        client: ClientInfo { email, phone },
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn extracts_name_and_price() {
        let draft = extract("кофе 200 рублей").unwrap();
        assert_eq!(draft.items.len(), 1);
        assert_eq!(draft.items[0].name, "кофе");
        assert_eq!(draft.items[0].unit_price, dec!(200));
    }

    #[test]
    fn strips_command_stopwords_from_name() {
        let draft = extract("создай чек на латте с корицей 250р").unwrap();
        assert_eq!(draft.items[0].name, "латте с корицей");
    }

    #[test]
    fn extracts_multiple_items() {
        let draft = extract("пицца 450 руб и кола 90 руб").unwrap();
        assert_eq!(draft.items.len(), 2);
        assert_eq!(draft.items[1].name, "кола");
        assert_eq!(draft.items[1].unit_price, dec!(90));
    }

    #[test]
    fn extracts_email_and_keeps_it_out_of_prices() {
        let draft = extract("кофе 200₽ на ivan123@mail.ru").unwrap();
        assert_eq!(draft.client.email.as_deref(), Some("ivan123@mail.ru"));
        assert_eq!(draft.items.len(), 1);
        assert_eq!(draft.items[0].unit_price, dec!(200));
    }

    #[test]
    fn ruble_sign_without_name_yields_generic_item() {
        let draft = extract("чек 300₽").unwrap();
        assert_eq!(draft.items[0].name, GENERIC_ITEM_NAME);
        assert_eq!(draft.items[0].unit_price, dec!(300));
    }

    #[test]
    fn no_price_at_all_yields_placeholder() {
        let draft = extract("чек на консультацию без почты").unwrap();
        assert_eq!(draft.items[0].name, PLACEHOLDER_ITEM_NAME);
        assert_eq!(draft.items[0].unit_price, dec!(100));
    }

    #[test]
    fn decimal_comma_prices_parse() {
        let draft = extract("кофе 99,50 руб").unwrap();
        assert_eq!(draft.items[0].unit_price, dec!(99.50));
    }

    #[test]
    fn greeting_reaching_extractor_is_refused() {
        assert!(matches!(extract("привет"), Err(EngineError::Refusal(_))));
    }

    #[test]
    fn payment_keyword_detection() {
        assert_eq!(detect_payment_kind("оплата наличными"), Some(PaymentKind::Cash));
        assert_eq!(detect_payment_kind("оплатил картой"), Some(PaymentKind::Card));
        assert_eq!(detect_payment_kind("кофе 200"), None);
    }
}
