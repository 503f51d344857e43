//! Completion provider trait.

use async_trait::async_trait;

use crate::error::Result;

/// A language-model backend that answers a single structured prompt.
///
/// Implementations wrap specific providers (GigaChat, YandexGPT,
/// GPTunnel) and own their auth flow and timeouts. Every failure mode
/// (timeout, non-2xx, malformed body) comes back as
/// [`crate::error::EngineError::Completion`]; the extractor swallows
/// it and runs the deterministic fallback, so a provider can never
/// fail a request.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Send the prompt, return the raw response text.
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Provider id for logs ("gigachat", "yandexgpt", "gptunnel").
    fn name(&self) -> &'static str;
}
