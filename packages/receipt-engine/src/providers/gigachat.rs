//! Sber GigaChat provider.
//!
//! Auth is a two-step flow: the long-lived authorization key is
//! exchanged for a short-lived bearer token at the NGW OAuth endpoint
//! before each completion call. Token failures surface as completion
//! errors and are never retried within a request.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, Result};
use crate::traits::CompletionProvider;

const OAUTH_URL: &str = "https://ngw.devices.sberbank.ru:9443/api/v2/oauth";
const API_URL: &str = "https://gigachat.devices.sberbank.ru/api/v1";

const TOKEN_TIMEOUT: Duration = Duration::from_secs(5);
const COMPLETION_TIMEOUT: Duration = Duration::from_secs(20);

pub struct GigaChat {
    client: Client,
    auth_key: String,
    model: String,
    oauth_url: String,
    base_url: String,
}

impl GigaChat {
    pub fn new(auth_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            auth_key: auth_key.into(),
            model: "GigaChat".to_string(),
            oauth_url: OAUTH_URL.to_string(),
            base_url: API_URL.to_string(),
        }
    }

    /// Override endpoints (tests, proxies).
    pub fn with_urls(mut self, oauth_url: impl Into<String>, base_url: impl Into<String>) -> Self {
        self.oauth_url = oauth_url.into();
        self.base_url = base_url.into();
        self
    }

    /// Exchange the authorization key for a short-lived bearer token.
    async fn fetch_token(&self) -> Result<String> {
        let response = self
            .client
            .post(&self.oauth_url)
            .timeout(TOKEN_TIMEOUT)
            .header("Authorization", format!("Basic {}", self.auth_key))
            .header("RqUID", Uuid::new_v4().to_string())
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body("scope=GIGACHAT_API_PERS")
            .send()
            .await
            .map_err(|e| EngineError::Completion(e.to_string().into()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::Completion(
                format!("GigaChat OAuth error ({status}): {body}").into(),
            ));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| EngineError::Completion(e.to_string().into()))?;
        Ok(token.access_token)
    }
}

#[async_trait]
impl CompletionProvider for GigaChat {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let token = self.fetch_token().await?;

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: 0.0,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .timeout(COMPLETION_TIMEOUT)
            .header("Authorization", format!("Bearer {token}"))
            .json(&request)
            .send()
            .await
            .map_err(|e| EngineError::Completion(e.to_string().into()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::Completion(
                format!("GigaChat API error ({status}): {body}").into(),
            ));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| EngineError::Completion(e.to_string().into()))?;

        chat.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| EngineError::Completion("no choices in GigaChat response".into()))
    }

    fn name(&self) -> &'static str {
        "gigachat"
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}
