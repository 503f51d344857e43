//! Natural-Language Receipt Engine
//!
//! Turns free-form Russian text ("кофе 200 рублей") into a structured
//! fiscal receipt, submits it to the ecomkassa gateway and records the
//! attempt in a ledger.
//!
//! # Design Philosophy
//!
//! - Extraction is best-effort, submission is exact: a model parses
//!   the text when a provider is configured, a deterministic parser
//!   always stands behind it, and everything monetary is reconciled
//!   before the validation gate lets a draft out.
//! - Gateway failures are data, not errors: a failed or
//!   unauthenticated submission becomes a demo-flagged result and the
//!   request still succeeds.
//! - Idempotency by content: retrying the same (text, draft) pair
//!   updates one ledger row instead of issuing a second receipt.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use receipt_engine::{EcomkassaClient, MemoryLedger, Pipeline, ProcessRequest};
//!
//! let pipeline = Pipeline::new(
//!     Arc::new(EcomkassaClient::new()),
//!     Arc::new(MemoryLedger::new()),
//! );
//!
//! let response = pipeline
//!     .process(ProcessRequest {
//!         message: "кофе 200 рублей, почта ivan@mail.ru".into(),
//!         ..Default::default()
//!     })
//!     .await?;
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Core trait abstractions (CompletionProvider, FiscalGateway, ReceiptLedger)
//! - [`types`] - Receipt domain types and settings
//! - [`pipeline`] - End-to-end request orchestration
//! - [`providers`] - Completion provider implementations
//! - [`gateway`] - Ecomkassa gateway client
//! - [`ledger`] - Ledger implementations (MemoryLedger, PostgresLedger)
//! - [`testing`] - Mock implementations for testing

pub mod commands;
pub mod error;
pub mod extract;
pub mod fallback;
pub mod gateway;
pub mod idempotency;
pub mod intent;
pub mod json_scan;
pub mod ledger;
pub mod normalize;
pub mod pipeline;
pub mod prompts;
pub mod providers;
pub mod testing;
pub mod traits;
pub mod types;
pub mod validate;

// Re-export core types at crate root
pub use error::{EngineError, Result};
pub use gateway::EcomkassaClient;
#[cfg(feature = "postgres")]
pub use ledger::PostgresLedger;
pub use ledger::MemoryLedger;
pub use pipeline::{Pipeline, ProcessRequest, ProcessResponse};
pub use traits::{CompletionProvider, FiscalGateway, ReceiptLedger, SubmissionOutcome};
pub use types::{
    EngineSettings, LineItem, OperationType, PaymentSplit, PersistedReceipt, ProviderCredentials,
    ReceiptDraft, ReceiptStatus,
};
