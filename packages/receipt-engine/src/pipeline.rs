//! The end-to-end request pipeline.
//!
//! One entry point, [`Pipeline::process`]: intent filter, command
//! detection, extraction (model first, deterministic fallback),
//! normalization, validation gate, gateway submission and ledger
//! write. Exactly one ledger row is written per submission attempt.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::commands::{self, Command, RepeatTarget};
use crate::error::{EngineError, Result};
use crate::traits::{CompletionProvider, FiscalGateway, ReceiptLedger, SubmissionOutcome};
use crate::types::{
    EngineSettings, OperationType, PersistedReceipt, ReceiptDraft, ReceiptStatus,
};
use crate::{extract, fallback, idempotency, intent, normalize, providers, validate};

/// One processing request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessRequest {
    /// Raw user text.
    pub message: String,

    /// Explicit operation choice; overrides keyword inference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_hint: Option<OperationType>,

    /// Build and return the draft without submitting.
    #[serde(default)]
    pub preview_only: bool,

    /// Merged engine settings for this request.
    #[serde(default)]
    pub settings: EngineSettings,

    /// Draft from the prior incomplete turn, merged under the new one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_draft: Option<ReceiptDraft>,

    /// Operator-edited draft; skips extraction entirely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_draft: Option<ReceiptDraft>,

    /// Caller-supplied idempotency key; derived from content when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
}

/// Result of one processing request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessResponse {
    pub success: bool,

    /// Human-readable Russian summary for the chat surface.
    pub message: String,

    pub draft: ReceiptDraft,

    pub operation: OperationType,

    /// True when no real fiscal document was issued.
    pub demo: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permalink: Option<String>,

    /// Idempotency key the attempt was recorded under (absent for
    /// previews).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,

    /// True for preview responses: nothing was submitted or recorded.
    #[serde(default)]
    pub preview: bool,

    /// Item-level detail needs operator review (total mismatch).
    #[serde(default)]
    pub needs_review: bool,

    /// All keys written by a bulk repeat, in submission order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub external_ids: Vec<String>,

    /// Raw gateway error body when submission failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The wired pipeline: gateway and ledger are fixed at construction,
/// the completion provider is chosen per request from settings.
pub struct Pipeline {
    gateway: Arc<dyn FiscalGateway>,
    ledger: Arc<dyn ReceiptLedger>,
    provider_override: Option<Arc<dyn CompletionProvider>>,
}

impl Pipeline {
    pub fn new(gateway: Arc<dyn FiscalGateway>, ledger: Arc<dyn ReceiptLedger>) -> Self {
        Self {
            gateway,
            ledger,
            provider_override: None,
        }
    }

    /// Use a fixed provider instead of building one from settings.
    pub fn with_provider(mut self, provider: Arc<dyn CompletionProvider>) -> Self {
        self.provider_override = Some(provider);
        self
    }

    /// Process one user request end to end.
    pub async fn process(&self, request: ProcessRequest) -> Result<ProcessResponse> {
        let settings = &request.settings;
        let has_context =
            !settings.context_message.trim().is_empty() || request.previous_draft.is_some();

        intent::check(&request.message, has_context)?;

        if let Some(command) = commands::detect(&request.message) {
            return self.run_command(command, &request).await;
        }

        // Multi-turn continuations see the accumulated prior text too.
        let text = if settings.context_message.trim().is_empty() {
            request.message.clone()
        } else {
            format!("{}\n{}", settings.context_message.trim(), request.message)
        };

        let mut draft = match &request.edited_draft {
            Some(edited) => edited.clone(),
            None => self.extract_draft(&text, &request).await?,
        };

        if request.edited_draft.is_none() {
            if let Some(previous) = &request.previous_draft {
                draft = normalize::merge_with_previous(draft, previous);
            }
            draft.operation = OperationType::infer(&text, request.operation_hint);
            draft = normalize::normalize(draft, &text, settings);
        }

        if request.preview_only {
            return Ok(preview_response(draft));
        }

        validate::check_draft(&draft)?;

        let external_id = request
            .external_id
            .clone()
            .unwrap_or_else(|| idempotency::derive_key(&text, &draft));

        let (row, outcome) = self
            .submit_one(&request.message, draft, &external_id, settings)
            .await?;

        Ok(submission_response(row, outcome))
    }

    /// Choose the extraction strategy: model completion when a provider
    /// is configured, deterministic parsing otherwise or on fallback.
    async fn extract_draft(&self, text: &str, request: &ProcessRequest) -> Result<ReceiptDraft> {
        let provider: Option<Arc<dyn CompletionProvider>> = match &self.provider_override {
            Some(p) => Some(p.clone()),
            None => providers::from_settings(&request.settings).map(Arc::from),
        };

        if let Some(provider) = provider {
            if let Some(draft) = extract::extract_with_model(
                provider.as_ref(),
                text,
                request.previous_draft.as_ref(),
            )
            .await?
            {
                debug!(provider = provider.name(), "model extraction succeeded");
                return Ok(draft);
            }
        }

        fallback::extract(text)
    }

    async fn run_command(
        &self,
        command: Command,
        request: &ProcessRequest,
    ) -> Result<ProcessResponse> {
        match command {
            Command::Repeat(target) => {
                let source = self.resolve_target(&target).await?;
                require_credentials_for(&source, &request.settings)?;
                let external_id = idempotency::derive_key(&request.message, &source.draft);
                let (row, outcome) = self
                    .submit_one(&request.message, source.draft, &external_id, &request.settings)
                    .await?;
                Ok(submission_response(row, outcome))
            }
            Command::Bulk { count, target } => {
                // The ceiling is checked before any ledger lookup.
                validate::check_bulk_count(count)?;
                let source = self.resolve_target(&target).await?;
                require_credentials_for(&source, &request.settings)?;
                let base = idempotency::derive_key(&request.message, &source.draft);

                let mut external_ids = Vec::with_capacity(count as usize);
                let mut issued = 0u32;
                let mut last: Option<(PersistedReceipt, SubmissionOutcome)> = None;
                for n in 1..=count {
                    let external_id = format!("{base}_{n}");
                    let (row, outcome) = self
                        .submit_one(
                            &request.message,
                            source.draft.clone(),
                            &external_id,
                            &request.settings,
                        )
                        .await?;
                    if outcome.success {
                        issued += 1;
                    }
                    external_ids.push(external_id);
                    last = Some((row, outcome));
                }

                // Count >= 1 is guaranteed by the ceiling check.
                let (row, outcome) = last.expect("bulk count is at least one");
                let mut response = submission_response(row, outcome);
                response.message = format!(
                    "Создано копий чека: {issued} из {count}{}",
                    if response.demo { " (демо-режим)" } else { "" }
                );
                response.external_ids = external_ids;
                Ok(response)
            }
        }
    }

    /// Resolve a repeat target to the ledger row it points at.
    async fn resolve_target(&self, target: &RepeatTarget) -> Result<PersistedReceipt> {
        match target {
            RepeatTarget::Last => self
                .ledger
                .find_last_success()
                .await?
                .ok_or_else(|| EngineError::ReceiptNotFound {
                    id: "последний".to_string(),
                }),
            RepeatTarget::Id(id) => {
                if let Some(row) = self.ledger.find_by_uuid(id).await? {
                    return Ok(row);
                }
                self.ledger
                    .find_by_external_id(id)
                    .await?
                    .ok_or_else(|| EngineError::ReceiptNotFound { id: id.clone() })
            }
        }
    }

    /// One submission attempt: gateway call, then exactly one ledger
    /// upsert recording the outcome.
    async fn submit_one(
        &self,
        user_message: &str,
        draft: ReceiptDraft,
        external_id: &str,
        settings: &EngineSettings,
    ) -> Result<(PersistedReceipt, SubmissionOutcome)> {
        let operation = draft.operation;
        let outcome = self
            .gateway
            .submit(&draft, operation, external_id, settings)
            .await;

        let mut row = PersistedReceipt::new(external_id, user_message, draft);
        row.status = if outcome.success {
            ReceiptStatus::Success
        } else {
            ReceiptStatus::Failed
        };
        row.demo = outcome.demo;
        row.uuid = outcome.uuid.clone();
        row.permalink = outcome.permalink.clone();

        self.ledger.upsert(&row).await?;
        info!(
            external_id,
            operation = operation.endpoint(),
            success = outcome.success,
            demo = outcome.demo,
            "submission recorded"
        );
        Ok((row, outcome))
    }
}

/// Repeating a real (non-demo) receipt re-issues a fiscal document,
/// which needs the gateway account the original was issued under.
fn require_credentials_for(source: &PersistedReceipt, settings: &EngineSettings) -> Result<()> {
    if !source.demo && !settings.has_merchant_credentials() {
        return Err(EngineError::MissingConfig("ecomkassa".to_string()));
    }
    Ok(())
}

fn format_total(total: rust_decimal::Decimal) -> String {
    total.normalize().to_string()
}

fn preview_response(draft: ReceiptDraft) -> ProcessResponse {
    let operation = draft.operation;
    let needs_review = draft.needs_review;
    let message = format!(
        "{} на сумму {} ₽. Проверь данные и подтверди отправку.",
        operation.display_name(),
        format_total(draft.payments_total())
    );
    ProcessResponse {
        success: true,
        message,
        draft,
        operation,
        demo: true,
        uuid: None,
        permalink: None,
        external_id: None,
        preview: true,
        needs_review,
        external_ids: Vec::new(),
        error: None,
    }
}

fn submission_response(row: PersistedReceipt, outcome: SubmissionOutcome) -> ProcessResponse {
    let operation = row.operation;
    let total = format_total(row.total);
    let message = if !outcome.success {
        format!(
            "Не удалось отправить чек: {}",
            outcome.error.as_deref().unwrap_or("неизвестная ошибка")
        )
    } else if outcome.demo {
        format!(
            "Чек создан в демо-режиме: {} на сумму {total} ₽. Касса не подключена.",
            operation.display_name()
        )
    } else {
        match &outcome.permalink {
            Some(link) => format!(
                "Чек оформлен: {} на сумму {total} ₽. Ссылка: {link}",
                operation.display_name()
            ),
            None => format!(
                "Чек оформлен: {} на сумму {total} ₽.",
                operation.display_name()
            ),
        }
    };

    ProcessResponse {
        success: outcome.success,
        message,
        needs_review: row.draft.needs_review,
        draft: row.draft,
        operation,
        demo: outcome.demo,
        uuid: outcome.uuid,
        permalink: outcome.permalink,
        external_id: Some(row.external_id),
        preview: false,
        external_ids: Vec::new(),
        error: outcome.error,
    }
}
