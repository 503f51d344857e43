//! In-memory ledger for tests and development.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::Result;
use crate::traits::ReceiptLedger;
use crate::types::{PersistedReceipt, ReceiptStatus};

/// In-memory ledger keyed by external id. Data is lost on restart.
pub struct MemoryLedger {
    rows: RwLock<HashMap<String, PersistedReceipt>>,
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored rows.
    pub fn len(&self) -> usize {
        self.rows.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ReceiptLedger for MemoryLedger {
    async fn upsert(&self, row: &PersistedReceipt) -> Result<()> {
        let mut rows = self.rows.write().unwrap();
        match rows.get_mut(&row.external_id) {
            Some(existing) => {
                // Original request text, draft and timestamp survive a
                // retried submission; only the observed result moves.
                existing.status = row.status;
                existing.demo = row.demo;
                existing.uuid = row.uuid.clone();
                existing.permalink = row.permalink.clone();
                existing.total = row.total;
            }
            None => {
                rows.insert(row.external_id.clone(), row.clone());
            }
        }
        Ok(())
    }

    async fn find_by_uuid(&self, uuid: &str) -> Result<Option<PersistedReceipt>> {
        Ok(self
            .rows
            .read()
            .unwrap()
            .values()
            .find(|r| r.uuid.as_deref() == Some(uuid))
            .cloned())
    }

    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<PersistedReceipt>> {
        Ok(self.rows.read().unwrap().get(external_id).cloned())
    }

    async fn find_last_success(&self) -> Result<Option<PersistedReceipt>> {
        Ok(self
            .rows
            .read()
            .unwrap()
            .values()
            .filter(|r| r.status == ReceiptStatus::Success && !r.demo)
            .max_by_key(|r| r.created_at)
            .cloned())
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<PersistedReceipt>> {
        let mut rows: Vec<PersistedReceipt> = self.rows.read().unwrap().values().cloned().collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }
}
