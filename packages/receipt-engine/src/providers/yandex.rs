//! YandexGPT provider: static API key, cloud-folder-scoped model URI.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::traits::CompletionProvider;

const COMPLETION_URL: &str = "https://llm.api.cloud.yandex.net/foundationModels/v1/completion";
const COMPLETION_TIMEOUT: Duration = Duration::from_secs(20);

pub struct YandexGpt {
    client: Client,
    api_key: String,
    folder_id: String,
    url: String,
}

impl YandexGpt {
    pub fn new(api_key: impl Into<String>, folder_id: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            folder_id: folder_id.into(),
            url: COMPLETION_URL.to_string(),
        }
    }

    /// Override the endpoint (tests).
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    fn model_uri(&self) -> String {
        format!("gpt://{}/yandexgpt-lite/latest", self.folder_id)
    }
}

#[async_trait]
impl CompletionProvider for YandexGpt {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = CompletionRequest {
            model_uri: self.model_uri(),
            completion_options: CompletionOptions {
                stream: false,
                temperature: 0.0,
                max_tokens: "2000".to_string(),
            },
            messages: vec![Message {
                role: "user".to_string(),
                text: prompt.to_string(),
            }],
        };

        let response = self
            .client
            .post(&self.url)
            .timeout(COMPLETION_TIMEOUT)
            .header("Authorization", format!("Api-Key {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| EngineError::Completion(e.to_string().into()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::Completion(
                format!("YandexGPT API error ({status}): {body}").into(),
            ));
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| EngineError::Completion(e.to_string().into()))?;

        completion
            .result
            .alternatives
            .into_iter()
            .next()
            .map(|a| a.message.text)
            .ok_or_else(|| EngineError::Completion("no alternatives in YandexGPT response".into()))
    }

    fn name(&self) -> &'static str {
        "yandexgpt"
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CompletionRequest {
    model_uri: String,
    completion_options: CompletionOptions,
    messages: Vec<Message>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CompletionOptions {
    stream: bool,
    temperature: f32,
    max_tokens: String,
}

#[derive(Serialize)]
struct Message {
    role: String,
    text: String,
}

#[derive(Deserialize)]
struct CompletionResponse {
    result: CompletionResult,
}

#[derive(Deserialize)]
struct CompletionResult {
    alternatives: Vec<Alternative>,
}

#[derive(Deserialize)]
struct Alternative {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_uri_is_folder_scoped() {
        let provider = YandexGpt::new("key", "b1gfolder");
        assert_eq!(provider.model_uri(), "gpt://b1gfolder/yandexgpt-lite/latest");
    }
}
