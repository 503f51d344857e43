//! Application setup and router wiring.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use receipt_engine::types::EngineSettings;
use receipt_engine::{Pipeline, ReceiptLedger};
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::routes::{health_handler, list_handler, process_handler};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub ledger: Arc<dyn ReceiptLedger>,
    pub defaults: EngineSettings,
    pub db_pool: Option<PgPool>,
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/v1/receipts/process", post(process_handler))
        .route("/v1/receipts", get(list_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
