use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::traits::{FiscalGateway, SubmissionOutcome};
use crate::types::{EngineSettings, OperationType, ReceiptDraft};

use super::payload::{build_payload, permalink};

const BASE_URL: &str = "https://app.ecomkassa.ru/fr-api/possystem/v4";

const TOKEN_TIMEOUT: Duration = Duration::from_secs(10);
const SUBMIT_TIMEOUT: Duration = Duration::from_secs(15);

/// HTTP client for the ecomkassa fiscalization API.
///
/// Never returns an error from [`FiscalGateway::submit`]: missing
/// credentials produce a demo outcome, transport and API failures
/// produce a failed outcome carrying the gateway's message verbatim.
pub struct EcomkassaClient {
    client: Client,
    base_url: String,
}

impl Default for EcomkassaClient {
    fn default() -> Self {
        Self::new()
    }
}

impl EcomkassaClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: BASE_URL.to_string(),
        }
    }

    /// Override the endpoint (tests, staging).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    async fn fetch_token(&self, login: &str, password: &str) -> std::result::Result<String, String> {
        let response = self
            .client
            .post(format!("{}/getToken", self.base_url))
            .timeout(TOKEN_TIMEOUT)
            .json(&TokenRequest {
                login: login.to_string(),
                pass: password.to_string(),
            })
            .send()
            .await
            .map_err(|e| format!("token request failed: {e}"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!("token request rejected ({status}): {body}"));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| format!("malformed token response: {e}"))?;

        match token.token {
            Some(t) if !t.is_empty() => Ok(t),
            _ => Err(token
                .error
                .map(|e| e.text)
                .unwrap_or_else(|| "token response carried no token".to_string())),
        }
    }
}

#[async_trait]
impl FiscalGateway for EcomkassaClient {
    async fn submit(
        &self,
        draft: &ReceiptDraft,
        operation: OperationType,
        external_id: &str,
        settings: &EngineSettings,
    ) -> SubmissionOutcome {
        if !settings.has_merchant_credentials() {
            tracing::info!(external_id, "merchant credentials absent, demo submission");
            return SubmissionOutcome::demo();
        }

        let token = match self
            .fetch_token(&settings.ecomkassa_login, &settings.ecomkassa_password)
            .await
        {
            Ok(token) => token,
            Err(message) => {
                tracing::warn!(external_id, %message, "gateway token acquisition failed");
                return SubmissionOutcome::failed(message);
            }
        };

        let payload = build_payload(draft, external_id, Utc::now());
        let url = format!(
            "{}/{}/{}?token={}",
            self.base_url,
            settings.group_code,
            operation.endpoint(),
            token
        );

        let response = match self
            .client
            .post(&url)
            .timeout(SUBMIT_TIMEOUT)
            .json(&payload)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                let message = format!("gateway request failed: {e}");
                tracing::warn!(external_id, %message, "fiscal submission failed");
                return SubmissionOutcome::failed(message);
            }
        };

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let parsed: SubmitResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(_) => {
                let message = format!("gateway response unreadable ({status}): {body}");
                tracing::warn!(external_id, %message, "fiscal submission failed");
                return SubmissionOutcome::failed(message);
            }
        };

        if let Some(error) = parsed.error {
            tracing::warn!(external_id, error = %error.text, "gateway rejected receipt");
            return SubmissionOutcome::failed(error.text);
        }

        match parsed.uuid {
            Some(uuid) if !uuid.is_empty() => {
                tracing::info!(external_id, %uuid, "receipt accepted by gateway");
                let link = permalink(&uuid);
                SubmissionOutcome {
                    success: true,
                    demo: false,
                    uuid: Some(uuid),
                    permalink: Some(link),
                    error: None,
                }
            }
            _ => {
                let message = format!("gateway returned no uuid ({status}): {body}");
                tracing::warn!(external_id, %message, "fiscal submission failed");
                SubmissionOutcome::failed(message)
            }
        }
    }
}

#[derive(Serialize)]
struct TokenRequest {
    login: String,
    pass: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    token: Option<String>,
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct SubmitResponse {
    uuid: Option<String>,
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct ApiError {
    text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn demo_outcome_without_credentials() {
        let gateway = EcomkassaClient::new();
        let settings = EngineSettings::default();
        let outcome = gateway
            .submit(
                &ReceiptDraft::default(),
                OperationType::Sell,
                "test_1",
                &settings,
            )
            .await;
        assert!(outcome.success);
        assert!(outcome.demo);
        assert!(outcome.uuid.is_some());
    }
}
