//! Receipt ledger trait.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::PersistedReceipt;

/// Persistent store of all submission attempts, keyed by idempotency
/// identifier.
///
/// The upsert-by-key contract is the engine's only duplicate guard:
/// retried submissions update the externally-observed result of the
/// existing row while the original request text and draft stay as
/// first written.
#[async_trait]
pub trait ReceiptLedger: Send + Sync {
    /// Insert or update the row for `row.external_id`.
    async fn upsert(&self, row: &PersistedReceipt) -> Result<()>;

    /// Look up by the uuid the gateway assigned.
    async fn find_by_uuid(&self, uuid: &str) -> Result<Option<PersistedReceipt>>;

    /// Look up by idempotency key.
    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<PersistedReceipt>>;

    /// Most recent successful, non-demo receipt.
    async fn find_last_success(&self) -> Result<Option<PersistedReceipt>>;

    /// Recent rows, newest first.
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<PersistedReceipt>>;
}
