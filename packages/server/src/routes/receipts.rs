//! Receipt processing and history endpoints.

use axum::extract::{Query, State};
use axum::Json;
use receipt_engine::types::EngineSettings;
use receipt_engine::{PersistedReceipt, ProcessRequest, ProcessResponse};
use serde::Deserialize;

use crate::app::AppState;
use crate::error::ApiError;

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

/// POST /v1/receipts/process
///
/// Request-supplied settings win field by field over the server's
/// environment defaults before the pipeline sees them.
pub async fn process_handler(
    State(state): State<AppState>,
    Json(mut request): Json<ProcessRequest>,
) -> Result<Json<ProcessResponse>, ApiError> {
    request.settings = EngineSettings::merged(&state.defaults, request.settings);
    let response = state.pipeline.process(request).await?;
    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
}

/// GET /v1/receipts?limit=&offset=
///
/// Recent submission attempts, newest first.
pub async fn list_handler(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<PersistedReceipt>>, ApiError> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let offset = params.offset.unwrap_or(0).max(0);
    let rows = state.ledger.list(limit, offset).await?;
    Ok(Json(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use receipt_engine::testing::MockGateway;
    use receipt_engine::{MemoryLedger, Pipeline};
    use std::sync::Arc;

    fn state() -> AppState {
        let gateway = Arc::new(MockGateway::accepting("uuid-1"));
        let ledger = Arc::new(MemoryLedger::new());
        AppState {
            pipeline: Arc::new(Pipeline::new(gateway, ledger.clone())),
            ledger,
            defaults: EngineSettings {
                ecomkassa_login: "l".into(),
                ecomkassa_password: "p".into(),
                group_code: "g".into(),
                inn: "7701234567".into(),
                company_email: "shop@firm.ru".into(),
                payment_address: "shop.ru".into(),
                ..Default::default()
            },
            db_pool: None,
        }
    }

    #[tokio::test]
    async fn process_then_list_round_trip() {
        let state = state();

        let request = ProcessRequest {
            message: "кофе 200 рублей, почта ivan@mail.ru".into(),
            ..Default::default()
        };
        let response = process_handler(State(state.clone()), Json(request))
            .await
            .unwrap();
        assert!(response.0.success);

        let listed = list_handler(
            State(state),
            Query(ListParams {
                limit: None,
                offset: None,
            }),
        )
        .await
        .unwrap();
        assert_eq!(listed.0.len(), 1);
    }

    #[tokio::test]
    async fn defaults_backfill_empty_request_settings() {
        let state = state();

        // No settings in the request: env defaults carry the merchant.
        let request = ProcessRequest {
            message: "кофе 200 рублей".into(),
            ..Default::default()
        };
        let response = process_handler(State(state), Json(request)).await.unwrap();
        assert!(response.0.success);
        assert_eq!(
            response.0.draft.client.email.as_deref(),
            Some("shop@firm.ru")
        );
    }
}
