//! Fiscal gateway trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::{EngineSettings, OperationType, ReceiptDraft};

/// Result of one submission attempt.
///
/// Gateway failures are data, not errors: a failed or unauthenticated
/// submission produces a demo-flagged outcome carrying the raw error
/// body, and the request as a whole still succeeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionOutcome {
    pub success: bool,

    /// True when no real fiscal document was issued (missing
    /// credentials or gateway error).
    pub demo: bool,

    /// Receipt uuid assigned by the gateway.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,

    /// Public check link for the issued receipt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permalink: Option<String>,

    /// Raw gateway error body, verbatim, when submission failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SubmissionOutcome {
    /// Demo outcome for submissions without merchant credentials. A
    /// synthetic uuid is issued so callers always get a reference.
    pub fn demo() -> Self {
        Self {
            success: true,
            demo: true,
            uuid: Some(format!("demo-{}", uuid::Uuid::new_v4())),
            permalink: None,
            error: None,
        }
    }

    /// Demo-flagged failure carrying the gateway's error body.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            demo: true,
            uuid: None,
            permalink: None,
            error: Some(error.into()),
        }
    }
}

/// Submits normalized drafts to the external fiscal gateway.
#[async_trait]
pub trait FiscalGateway: Send + Sync {
    /// Authenticate and submit one draft under the given external id.
    ///
    /// Never returns an error for gateway-side failures; those are
    /// folded into the outcome. Once a submission is in flight it is
    /// allowed to complete or time out, never cancelled.
    async fn submit(
        &self,
        draft: &ReceiptDraft,
        operation: OperationType,
        external_id: &str,
        settings: &EngineSettings,
    ) -> SubmissionOutcome;
}
