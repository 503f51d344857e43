//! Testing utilities including mock implementations.
//!
//! Lets applications exercise the full pipeline without real model or
//! gateway calls.

use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;

use crate::error::{EngineError, Result};
use crate::traits::{CompletionProvider, FiscalGateway, SubmissionOutcome};
use crate::types::{EngineSettings, OperationType, ReceiptDraft};

/// A mock completion provider with scripted responses.
///
/// Responses are consumed in order; the last one repeats once the
/// script runs out.
pub struct MockProvider {
    responses: Mutex<Vec<String>>,
    fail: bool,
    prompts: Arc<RwLock<Vec<String>>>,
}

impl MockProvider {
    /// Provider that always returns the given completion.
    pub fn returning(response: impl Into<String>) -> Self {
        Self {
            responses: Mutex::new(vec![response.into()]),
            fail: false,
            prompts: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Provider that returns the given completions in order.
    pub fn scripted(responses: Vec<String>) -> Self {
        Self {
            responses: Mutex::new(responses),
            fail: false,
            prompts: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Provider whose every call errors.
    pub fn failing() -> Self {
        Self {
            responses: Mutex::new(Vec::new()),
            fail: true,
            prompts: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Prompts received so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.read().unwrap().clone()
    }
}

#[async_trait]
impl CompletionProvider for MockProvider {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.write().unwrap().push(prompt.to_string());
        if self.fail {
            return Err(EngineError::Completion("mock provider failure".into()));
        }
        let mut responses = self.responses.lock().unwrap();
        match responses.len() {
            0 => Err(EngineError::Completion("mock script exhausted".into())),
            1 => Ok(responses[0].clone()),
            _ => Ok(responses.remove(0)),
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// Record of one submission received by [`MockGateway`].
#[derive(Debug, Clone)]
pub struct RecordedSubmission {
    pub draft: ReceiptDraft,
    pub operation: OperationType,
    pub external_id: String,
}

/// A mock fiscal gateway returning a scripted outcome and recording
/// every submission for assertions.
pub struct MockGateway {
    outcome: SubmissionOutcome,
    submissions: Arc<RwLock<Vec<RecordedSubmission>>>,
}

impl MockGateway {
    /// Gateway that reports every submission with the given outcome.
    pub fn with_outcome(outcome: SubmissionOutcome) -> Self {
        Self {
            outcome,
            submissions: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Gateway that accepts everything with a fixed uuid.
    pub fn accepting(uuid: impl Into<String>) -> Self {
        let uuid = uuid.into();
        Self::with_outcome(SubmissionOutcome {
            success: true,
            demo: false,
            permalink: Some(crate::gateway::permalink(&uuid)),
            uuid: Some(uuid),
            error: None,
        })
    }

    /// Gateway that rejects everything with the given error body.
    pub fn rejecting(error: impl Into<String>) -> Self {
        Self::with_outcome(SubmissionOutcome::failed(error))
    }

    /// Submissions received so far.
    pub fn submissions(&self) -> Vec<RecordedSubmission> {
        self.submissions.read().unwrap().clone()
    }
}

#[async_trait]
impl FiscalGateway for MockGateway {
    async fn submit(
        &self,
        draft: &ReceiptDraft,
        operation: OperationType,
        external_id: &str,
        settings: &EngineSettings,
    ) -> SubmissionOutcome {
        self.submissions.write().unwrap().push(RecordedSubmission {
            draft: draft.clone(),
            operation,
            external_id: external_id.to_string(),
        });
        if !settings.has_merchant_credentials() {
            return SubmissionOutcome::demo();
        }
        self.outcome.clone()
    }
}

/// Settings with full merchant credentials, for submission tests.
pub fn test_settings() -> EngineSettings {
    EngineSettings {
        ecomkassa_login: "test-login".into(),
        ecomkassa_password: "test-pass".into(),
        group_code: "test_group".into(),
        inn: "7701234567".into(),
        company_email: "shop@firm.ru".into(),
        payment_address: "shop.ru".into(),
        ..Default::default()
    }
}
