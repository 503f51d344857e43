//! End-to-end pipeline tests against the in-memory ledger and mock
//! gateway/provider implementations.

use std::sync::Arc;

use receipt_engine::testing::{test_settings, MockGateway, MockProvider};
use receipt_engine::{
    EngineError, EngineSettings, MemoryLedger, OperationType, Pipeline, ProcessRequest,
};
use rust_decimal_macros::dec;

fn request(message: &str) -> ProcessRequest {
    ProcessRequest {
        message: message.to_string(),
        settings: test_settings(),
        ..Default::default()
    }
}

fn wired() -> (Pipeline, Arc<MockGateway>, Arc<MemoryLedger>) {
    let gateway = Arc::new(MockGateway::accepting("uuid-1"));
    let ledger = Arc::new(MemoryLedger::new());
    let pipeline = Pipeline::new(gateway.clone(), ledger.clone());
    (pipeline, gateway, ledger)
}

#[tokio::test]
async fn simple_text_becomes_a_submitted_receipt() {
    let (pipeline, gateway, ledger) = wired();

    let response = pipeline
        .process(request("кофе 200 рублей, почта ivan@mail.ru"))
        .await
        .unwrap();

    assert!(response.success);
    assert!(!response.demo);
    assert_eq!(response.uuid.as_deref(), Some("uuid-1"));
    assert_eq!(response.operation, OperationType::Sell);
    assert!(response.draft.is_balanced());
    assert_eq!(response.draft.payments_total(), dec!(200));
    assert_eq!(ledger.len(), 1);

    let submitted = gateway.submissions();
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0].draft.items[0].name, "кофе");
}

#[tokio::test]
async fn double_submit_updates_one_ledger_row() {
    let (pipeline, _, ledger) = wired();

    let first = pipeline
        .process(request("кофе 200 рублей, почта ivan@mail.ru"))
        .await
        .unwrap();
    let second = pipeline
        .process(request("кофе 200 рублей, почта ivan@mail.ru"))
        .await
        .unwrap();

    assert_eq!(first.external_id, second.external_id);
    assert_eq!(ledger.len(), 1);
}

#[tokio::test]
async fn greeting_is_refused_before_any_work() {
    let (pipeline, gateway, ledger) = wired();

    let err = pipeline.process(request("привет")).await.unwrap_err();
    assert!(matches!(err, EngineError::Refusal(_)));
    assert!(gateway.submissions().is_empty());
    assert!(ledger.is_empty());
}

#[tokio::test]
async fn missing_email_names_the_field() {
    let (pipeline, _, _) = wired();

    let mut req = request("кофе 200 рублей");
    req.settings.company_email = String::new();

    let err = pipeline.process(req).await.unwrap_err();
    assert!(matches!(err, EngineError::Validation { field: "email", .. }));
}

#[tokio::test]
async fn merchant_email_backfills_the_buyer() {
    let (pipeline, _, _) = wired();

    // test_settings carries a company email, so no buyer email needed.
    let response = pipeline.process(request("кофе 200 рублей")).await.unwrap();
    assert!(response.success);
    assert_eq!(
        response.draft.client.email.as_deref(),
        Some("shop@firm.ru")
    );
}

#[tokio::test]
async fn refund_keyword_routes_the_operation() {
    let (pipeline, gateway, _) = wired();

    let response = pipeline
        .process(request("возврат кофе 200 рублей, почта ivan@mail.ru"))
        .await
        .unwrap();

    assert_eq!(response.operation, OperationType::SellRefund);
    assert_eq!(
        gateway.submissions()[0].operation,
        OperationType::SellRefund
    );
}

#[tokio::test]
async fn preview_builds_without_submitting() {
    let (pipeline, gateway, ledger) = wired();

    let mut req = request("кофе 200 рублей, почта ivan@mail.ru");
    req.preview_only = true;

    let response = pipeline.process(req).await.unwrap();
    assert!(response.preview);
    assert!(response.external_id.is_none());
    assert!(gateway.submissions().is_empty());
    assert!(ledger.is_empty());
}

#[tokio::test]
async fn repeat_of_unknown_receipt_is_not_found() {
    let (pipeline, _, _) = wired();

    let err = pipeline
        .process(request("повтори чек deadbeef01"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ReceiptNotFound { .. }));
}

#[tokio::test]
async fn repeat_last_resubmits_the_latest_success() {
    let (pipeline, gateway, ledger) = wired();

    pipeline
        .process(request("кофе 200 рублей, почта ivan@mail.ru"))
        .await
        .unwrap();

    let response = pipeline
        .process(request("повтори последний чек"))
        .await
        .unwrap();

    assert!(response.success);
    assert_eq!(response.draft.items[0].name, "кофе");
    assert_eq!(gateway.submissions().len(), 2);
    // The repeat is a new attempt under its own key.
    assert_eq!(ledger.len(), 2);
}

#[tokio::test]
async fn repeat_by_uuid_finds_the_row() {
    let gateway = Arc::new(MockGateway::accepting("receipt0001"));
    let ledger = Arc::new(MemoryLedger::new());
    let pipeline = Pipeline::new(gateway.clone(), ledger.clone());

    pipeline
        .process(request("кофе 200 рублей, почта ivan@mail.ru"))
        .await
        .unwrap();

    let response = pipeline
        .process(request("повтори чек receipt0001"))
        .await
        .unwrap();

    assert!(response.success);
    assert_eq!(response.draft.items[0].name, "кофе");
    assert_eq!(gateway.submissions().len(), 2);
}

#[tokio::test]
async fn bulk_ceiling_is_checked_before_lookup() {
    let (pipeline, gateway, ledger) = wired();

    // The ledger is empty: a lookup-first implementation would report
    // not-found instead of the ceiling.
    let err = pipeline
        .process(request("создай 100 копий чека deadbeef99"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::BulkLimitExceeded {
            requested: 100,
            max: 50
        }
    ));
    assert!(gateway.submissions().is_empty());
    assert!(ledger.is_empty());
}

#[tokio::test]
async fn bulk_repeat_writes_one_row_per_copy() {
    let (pipeline, gateway, ledger) = wired();

    pipeline
        .process(request("кофе 200 рублей, почта ivan@mail.ru"))
        .await
        .unwrap();

    let response = pipeline
        .process(request("создай 3 копии чека"))
        .await
        .unwrap();

    assert!(response.success);
    assert_eq!(response.external_ids.len(), 3);
    assert!(response.external_ids[0].ends_with("_1"));
    assert!(response.external_ids[2].ends_with("_3"));
    assert_eq!(gateway.submissions().len(), 4);
    assert_eq!(ledger.len(), 4);
}

#[tokio::test]
async fn repeat_of_a_real_receipt_needs_credentials() {
    let (pipeline, _, _) = wired();

    pipeline
        .process(request("кофе 200 рублей, почта ivan@mail.ru"))
        .await
        .unwrap();

    // The original went out under a full merchant account; repeating
    // it without one is a configuration gap, not a silent demo.
    let req = ProcessRequest {
        message: "повтори последний чек".into(),
        settings: EngineSettings::default(),
        ..Default::default()
    };
    let err = pipeline.process(req).await.unwrap_err();
    assert!(matches!(err, EngineError::MissingConfig(_)));
}

#[tokio::test]
async fn no_credentials_means_demo_with_reference() {
    let gateway = Arc::new(MockGateway::accepting("uuid-1"));
    let ledger = Arc::new(MemoryLedger::new());
    let pipeline = Pipeline::new(gateway, ledger.clone());

    let req = ProcessRequest {
        message: "кофе 200 рублей, почта ivan@mail.ru".into(),
        settings: EngineSettings::default(),
        ..Default::default()
    };

    let response = pipeline.process(req).await.unwrap();
    assert!(response.success);
    assert!(response.demo);
    assert!(response.uuid.is_some());
    assert_eq!(ledger.len(), 1);
}

#[tokio::test]
async fn gateway_rejection_is_recorded_not_raised() {
    let gateway = Arc::new(MockGateway::rejecting("ИНН не зарегистрирован"));
    let ledger = Arc::new(MemoryLedger::new());
    let pipeline = Pipeline::new(gateway, ledger.clone());

    let response = pipeline
        .process(request("кофе 200 рублей, почта ivan@mail.ru"))
        .await
        .unwrap();

    assert!(!response.success);
    assert!(response.demo);
    assert_eq!(response.error.as_deref(), Some("ИНН не зарегистрирован"));
    assert_eq!(ledger.len(), 1);
    assert!(response.message.contains("ИНН не зарегистрирован"));
}

#[tokio::test]
async fn model_extraction_feeds_the_pipeline() {
    let gateway = Arc::new(MockGateway::accepting("uuid-1"));
    let ledger = Arc::new(MemoryLedger::new());
    let provider = Arc::new(MockProvider::returning(
        r#"{"items": [{"name": "консультация", "price": 5000}], "payments": [], "email": "ceo@firm.ru", "phone": null, "error": null}"#,
    ));
    let pipeline = Pipeline::new(gateway.clone(), ledger).with_provider(provider);

    let response = pipeline
        .process(request("консультация юриста пять тысяч, почта ceo@firm.ru"))
        .await
        .unwrap();

    assert!(response.success);
    assert_eq!(response.draft.items[0].name, "консультация");
    assert_eq!(response.draft.items[0].unit_price, dec!(5000));
    assert_eq!(response.draft.client.email.as_deref(), Some("ceo@firm.ru"));
}

#[tokio::test]
async fn failing_provider_falls_back_to_regex() {
    let gateway = Arc::new(MockGateway::accepting("uuid-1"));
    let ledger = Arc::new(MemoryLedger::new());
    let provider = Arc::new(MockProvider::failing());
    let pipeline = Pipeline::new(gateway, ledger).with_provider(provider);

    let response = pipeline
        .process(request("кофе 200 рублей, почта ivan@mail.ru"))
        .await
        .unwrap();

    assert!(response.success);
    assert_eq!(response.draft.items[0].name, "кофе");
}

#[tokio::test]
async fn context_merge_completes_a_prior_draft() {
    let (pipeline, _, _) = wired();

    // First turn: item but no price worth submitting; preview it.
    let mut first = request("чек на консультацию 5000 рублей без почты");
    first.preview_only = true;
    first.settings.company_email = String::new();
    let preview = pipeline.process(first).await.unwrap();

    // Second turn supplies only the email; prior draft carries over.
    let mut second = request("почта ivan@mail.ru");
    second.settings.company_email = String::new();
    second.previous_draft = Some(preview.draft);
    let response = pipeline.process(second).await.unwrap();

    assert!(response.success);
    assert_eq!(response.draft.items[0].name, "консультацию");
    assert_eq!(response.draft.client.email.as_deref(), Some("ivan@mail.ru"));
}

#[tokio::test]
async fn multi_item_mismatch_is_flagged_for_review() {
    let completion = r#"{"items": [{"name": "кофе", "price": 200}, {"name": "булка", "price": 50}],
        "payments": [{"type": "cash", "amount": 300}], "email": "a@b.ru", "phone": null, "error": null}"#;
    let gateway = Arc::new(MockGateway::accepting("uuid-9"));
    let ledger = Arc::new(MemoryLedger::new());
    let pipeline = Pipeline::new(gateway, ledger)
        .with_provider(Arc::new(MockProvider::returning(completion)));

    let response = pipeline
        .process(request("кофе и булка наличными триста"))
        .await
        .unwrap();

    assert!(response.needs_review);
    assert_eq!(response.draft.payments_total(), dec!(300));
}
