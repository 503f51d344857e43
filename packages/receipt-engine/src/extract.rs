//! Model-assisted receipt extraction.
//!
//! Sends the structured prompt via a [`CompletionProvider`], scans
//! the response for the first balanced JSON object and maps it into a
//! [`ReceiptDraft`]. Provider failures and unparseable output are
//! swallowed into `Ok(None)` so the caller falls back to the
//! deterministic extractor; only an explicit model-reported `error`
//! field becomes a user-facing validation failure.

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

use crate::error::{EngineError, Result};
use crate::json_scan;
use crate::prompts::build_extract_prompt;
use crate::traits::CompletionProvider;
use crate::types::{ClientInfo, LineItem, PaymentKind, PaymentSplit, ReceiptDraft};

/// JSON shape the prompt asks the model to produce.
#[derive(Debug, Deserialize)]
struct ModelReceipt {
    #[serde(default)]
    items: Vec<ModelItem>,
    #[serde(default)]
    payments: Vec<ModelPayment>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    phone: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelItem {
    name: String,
    price: Decimal,
    #[serde(default = "default_quantity")]
    quantity: Decimal,
}

#[derive(Debug, Deserialize)]
struct ModelPayment {
    #[serde(rename = "type", default)]
    kind: PaymentKind,
    amount: Decimal,
}

fn default_quantity() -> Decimal {
    Decimal::ONE
}

/// Run the model strategy. `Ok(None)` means "no usable completion";
/// the pipeline then runs the deterministic fallback.
pub async fn extract_with_model(
    provider: &dyn CompletionProvider,
    text: &str,
    previous: Option<&ReceiptDraft>,
) -> Result<Option<ReceiptDraft>> {
    let prompt = build_extract_prompt(text, previous);

    let response = match provider.complete(&prompt).await {
        Ok(body) => body,
        Err(err) => {
            debug!(provider = provider.name(), error = %err, "completion failed, falling back");
            return Ok(None);
        }
    };

    let Some(value) = json_scan::extract_object(&response) else {
        debug!(provider = provider.name(), "no JSON object in completion");
        return Ok(None);
    };

    let parsed: ModelReceipt = match serde_json::from_value(value) {
        Ok(parsed) => parsed,
        Err(err) => {
            debug!(provider = provider.name(), error = %err, "malformed model receipt");
            return Ok(None);
        }
    };

    // The model reporting a gap is a user problem, not a parse problem.
    if let Some(code) = parsed.error.as_deref().filter(|e| !e.is_empty()) {
        return Err(match code {
            "missing_price" => {
                EngineError::missing("price", "Не удалось определить цену. Укажи цену товара.")
            }
            other => EngineError::missing("message", format!("Не хватает данных: {other}")),
        });
    }

    let items: Vec<LineItem> = parsed
        .items
        .into_iter()
        .filter(|i| !i.name.trim().is_empty() && i.price >= Decimal::ZERO)
        .map(|i| {
            let mut item = LineItem::new(i.name.trim(), i.price);
            if i.quantity > Decimal::ZERO {
                item.quantity = i.quantity;
            }
            item
        })
        .collect();

    if items.is_empty() {
        return Ok(None);
    }

    let payments = parsed
        .payments
        .into_iter()
        .filter(|p| p.amount > Decimal::ZERO)
        .map(|p| PaymentSplit {
            kind: p.kind,
            amount: p.amount,
        })
        .collect();

    Ok(Some(ReceiptDraft {
        items,
        payments,
        client: ClientInfo {
            email: parsed.email.filter(|e| !e.trim().is_empty()),
            phone: parsed.phone.filter(|p| !p.trim().is_empty()),
        },
        ..Default::default()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockProvider;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn maps_model_json_into_draft() {
        let provider = MockProvider::returning(
            r#"Вот чек: {"items": [{"name": "кофе", "price": 200}], "payments": [], "email": "a@b.ru", "phone": null, "error": null}"#,
        );
        let draft = extract_with_model(&provider, "кофе 200", None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(draft.items.len(), 1);
        assert_eq!(draft.items[0].unit_price, dec!(200));
        assert_eq!(draft.client.email.as_deref(), Some("a@b.ru"));
    }

    #[tokio::test]
    async fn provider_failure_is_swallowed() {
        let provider = MockProvider::failing();
        let result = extract_with_model(&provider, "кофе 200", None).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn prose_without_json_is_swallowed() {
        let provider = MockProvider::returning("не могу помочь");
        let result = extract_with_model(&provider, "кофе 200", None).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn model_error_field_becomes_validation_failure() {
        let provider =
            MockProvider::returning(r#"{"items": [], "error": "missing_price"}"#);
        let err = extract_with_model(&provider, "кофе", None).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Validation { field: "price", .. }
        ));
    }

    #[tokio::test]
    async fn empty_item_list_falls_back() {
        let provider = MockProvider::returning(r#"{"items": [], "error": null}"#);
        let result = extract_with_model(&provider, "кофе 200", None).await.unwrap();
        assert!(result.is_none());
    }
}
