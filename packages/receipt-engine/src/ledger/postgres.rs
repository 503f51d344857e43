//! PostgreSQL ledger.
//!
//! Schema is applied on startup. The row keeps the full draft as JSONB
//! next to denormalized columns (items, payments, customer email) so
//! operators can query without unpacking JSON.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::info;

use crate::error::{EngineError, Result};
use crate::traits::ReceiptLedger;
use crate::types::{PersistedReceipt, ReceiptDraft, ReceiptStatus};

pub struct PostgresLedger {
    pool: PgPool,
}

impl PostgresLedger {
    /// Connect and apply the schema.
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(|e| EngineError::Storage(e.to_string().into()))?;
        Self::from_pool(pool).await
    }

    /// Reuse an existing pool (the server shares one).
    pub async fn from_pool(pool: PgPool) -> Result<Self> {
        let ledger = Self { pool };
        ledger.run_migrations().await?;
        Ok(ledger)
    }

    async fn run_migrations(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS receipts (
                external_id TEXT PRIMARY KEY,
                user_message TEXT NOT NULL,
                operation_type TEXT NOT NULL,
                draft JSONB NOT NULL,
                items JSONB NOT NULL DEFAULT '[]',
                payments JSONB NOT NULL DEFAULT '[]',
                customer_email TEXT,
                total NUMERIC NOT NULL DEFAULT 0,
                status TEXT NOT NULL,
                demo_mode BOOLEAN NOT NULL DEFAULT TRUE,
                uuid TEXT,
                permalink TEXT,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| EngineError::Storage(e.to_string().into()))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_receipts_uuid ON receipts(uuid)")
            .execute(&self.pool)
            .await
            .ok();
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_receipts_created_at ON receipts(created_at DESC)")
            .execute(&self.pool)
            .await
            .ok();

        info!("receipt ledger schema ready");
        Ok(())
    }

    fn row_to_receipt(row: &PgRow) -> Result<PersistedReceipt> {
        let draft_json: serde_json::Value = row
            .try_get("draft")
            .map_err(|e| EngineError::Storage(e.to_string().into()))?;
        let draft: ReceiptDraft = serde_json::from_value(draft_json)?;

        let status: String = row
            .try_get("status")
            .map_err(|e| EngineError::Storage(e.to_string().into()))?;
        let status = match status.as_str() {
            "success" => ReceiptStatus::Success,
            _ => ReceiptStatus::Failed,
        };

        let total: Decimal = row
            .try_get("total")
            .map_err(|e| EngineError::Storage(e.to_string().into()))?;
        let created_at: DateTime<Utc> = row
            .try_get("created_at")
            .map_err(|e| EngineError::Storage(e.to_string().into()))?;

        Ok(PersistedReceipt {
            external_id: row
                .try_get("external_id")
                .map_err(|e| EngineError::Storage(e.to_string().into()))?,
            user_message: row
                .try_get("user_message")
                .map_err(|e| EngineError::Storage(e.to_string().into()))?,
            operation: draft.operation,
            draft,
            total,
            status,
            demo: row
                .try_get("demo_mode")
                .map_err(|e| EngineError::Storage(e.to_string().into()))?,
            uuid: row
                .try_get("uuid")
                .map_err(|e| EngineError::Storage(e.to_string().into()))?,
            permalink: row
                .try_get("permalink")
                .map_err(|e| EngineError::Storage(e.to_string().into()))?,
            created_at,
        })
    }
}

#[async_trait]
impl ReceiptLedger for PostgresLedger {
    async fn upsert(&self, row: &PersistedReceipt) -> Result<()> {
        let draft = serde_json::to_value(&row.draft)?;
        let items = serde_json::to_value(&row.draft.items)?;
        let payments = serde_json::to_value(&row.draft.payments)?;

        sqlx::query(
            r#"
            INSERT INTO receipts (
                external_id, user_message, operation_type, draft, items,
                payments, customer_email, total, status, demo_mode, uuid,
                permalink, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (external_id) DO UPDATE SET
                status = EXCLUDED.status,
                demo_mode = EXCLUDED.demo_mode,
                uuid = EXCLUDED.uuid,
                permalink = EXCLUDED.permalink,
                total = EXCLUDED.total
            "#,
        )
        .bind(&row.external_id)
        .bind(&row.user_message)
        .bind(row.operation.endpoint())
        .bind(draft)
        .bind(items)
        .bind(payments)
        .bind(&row.draft.client.email)
        .bind(row.total)
        .bind(row.status.as_str())
        .bind(row.demo)
        .bind(&row.uuid)
        .bind(&row.permalink)
        .bind(row.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| EngineError::Storage(e.to_string().into()))?;

        Ok(())
    }

    async fn find_by_uuid(&self, uuid: &str) -> Result<Option<PersistedReceipt>> {
        let row = sqlx::query("SELECT * FROM receipts WHERE uuid = $1")
            .bind(uuid)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| EngineError::Storage(e.to_string().into()))?;
        row.as_ref().map(Self::row_to_receipt).transpose()
    }

    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<PersistedReceipt>> {
        let row = sqlx::query("SELECT * FROM receipts WHERE external_id = $1")
            .bind(external_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| EngineError::Storage(e.to_string().into()))?;
        row.as_ref().map(Self::row_to_receipt).transpose()
    }

    async fn find_last_success(&self) -> Result<Option<PersistedReceipt>> {
        let row = sqlx::query(
            "SELECT * FROM receipts WHERE status = 'success' AND demo_mode = FALSE \
             ORDER BY created_at DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| EngineError::Storage(e.to_string().into()))?;
        row.as_ref().map(Self::row_to_receipt).transpose()
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<PersistedReceipt>> {
        let rows = sqlx::query(
            "SELECT * FROM receipts ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| EngineError::Storage(e.to_string().into()))?;
        rows.iter().map(Self::row_to_receipt).collect()
    }
}
