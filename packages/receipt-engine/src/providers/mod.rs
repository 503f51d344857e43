//! Completion provider implementations.
//!
//! One type per backend; the factory selects an instance from the
//! request settings so no code deeper in the pipeline branches on
//! provider identifiers.

mod gigachat;
mod gptunnel;
mod yandex;

pub use gigachat::GigaChat;
pub use gptunnel::GptTunnel;
pub use yandex::YandexGpt;

use crate::traits::CompletionProvider;
use crate::types::{EngineSettings, ProviderCredentials};

/// Build the active provider from settings, if one is configured.
pub fn from_settings(settings: &EngineSettings) -> Option<Box<dyn CompletionProvider>> {
    match settings.provider.as_ref()? {
        ProviderCredentials::Gigachat { auth_key } => Some(Box::new(GigaChat::new(auth_key))),
        ProviderCredentials::Yandexgpt { api_key, folder_id } => {
            Some(Box::new(YandexGpt::new(api_key, folder_id)))
        }
        ProviderCredentials::Gptunnel { api_key, model } => {
            Some(Box::new(GptTunnel::new(api_key).with_model(model)))
        }
    }
}
