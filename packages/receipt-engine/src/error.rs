//! Typed errors for the receipt engine.
//!
//! Uses `thiserror` for library errors (not `anyhow`) so callers can
//! map each failure mode to the right HTTP status and user message.

use thiserror::Error;

/// Errors that can occur while processing a receipt request.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Off-topic or conversational input was refused before processing.
    ///
    /// Carries the fixed user-facing refusal message.
    #[error("{0}")]
    Refusal(String),

    /// A mandatory field is missing or malformed.
    ///
    /// `field` is a stable machine-readable name ("email", "price")
    /// consumed by the UI; `message` is the user-facing explanation.
    #[error("{message}")]
    Validation { field: &'static str, message: String },

    /// A repeat/bulk-repeat referenced a receipt that is not in the ledger.
    #[error("чек {id} не найден")]
    ReceiptNotFound { id: String },

    /// Bulk-repeat count above the ceiling.
    #[error("можно повторить не больше {max} чеков за раз (запрошено {requested})")]
    BulkLimitExceeded { requested: u32, max: u32 },

    /// Merchant or provider configuration required for this request is absent.
    #[error("не настроена интеграция: {0}")]
    MissingConfig(String),

    /// Completion provider call failed.
    ///
    /// Never surfaced to the caller: the extractor swallows this and
    /// falls back to the deterministic parser.
    #[error("completion provider error: {0}")]
    Completion(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Ledger read/write failed.
    #[error("storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    /// Missing-field validation failure with the standard message shape.
    pub fn missing(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
