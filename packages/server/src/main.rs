// Main entry point for the receipt API server

mod app;
mod config;
mod error;
mod routes;

use std::sync::Arc;

use anyhow::{Context, Result};
use receipt_engine::{EcomkassaClient, MemoryLedger, Pipeline, PostgresLedger, ReceiptLedger};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::{build_app, AppState};
use crate::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,receipt_engine=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting receipt API server");

    let config = Config::from_env().context("Failed to load configuration")?;

    let (ledger, db_pool): (Arc<dyn ReceiptLedger>, Option<PgPool>) = match &config.database_url {
        Some(url) => {
            tracing::info!("Connecting to database...");
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(url)
                .await
                .context("Failed to connect to database")?;
            let ledger = PostgresLedger::from_pool(pool.clone())
                .await
                .context("Failed to prepare receipt ledger")?;
            tracing::info!("Database connected");
            (Arc::new(ledger), Some(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using the in-memory ledger");
            (Arc::new(MemoryLedger::new()), None)
        }
    };

    let mut gateway = EcomkassaClient::new();
    if let Some(url) = &config.gateway_base_url {
        tracing::info!(url, "using fiscal gateway endpoint override");
        gateway = gateway.with_base_url(url.as_str());
    }
    let pipeline = Pipeline::new(Arc::new(gateway), ledger.clone());

    let app = build_app(AppState {
        pipeline: Arc::new(pipeline),
        ledger,
        defaults: config.defaults.clone(),
        db_pool,
    });

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Listening on {addr}");
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
