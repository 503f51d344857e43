//! Server configuration from environment variables.
//!
//! Merchant and provider values read here are only defaults: each
//! request may carry its own settings, which win field by field.

use anyhow::{Context, Result};
use receipt_engine::types::{EngineSettings, ProviderCredentials, TaxClass, TaxScheme};

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,

    /// Absent means the in-memory ledger (data lost on restart).
    pub database_url: Option<String>,

    /// Fiscal gateway endpoint override (staging, local stub).
    pub gateway_base_url: Option<String>,

    /// Environment-level defaults merged under request settings.
    pub defaults: EngineSettings,
}

fn env_or_default(key: &str) -> String {
    std::env::var(key).unwrap_or_default()
}

fn provider_from_env() -> Option<ProviderCredentials> {
    if let Ok(auth_key) = std::env::var("GIGACHAT_AUTH_KEY") {
        if !auth_key.trim().is_empty() {
            return Some(ProviderCredentials::Gigachat { auth_key });
        }
    }
    if let (Ok(api_key), Ok(folder_id)) =
        (std::env::var("YANDEX_API_KEY"), std::env::var("YANDEX_FOLDER_ID"))
    {
        if !api_key.trim().is_empty() && !folder_id.trim().is_empty() {
            return Some(ProviderCredentials::Yandexgpt { api_key, folder_id });
        }
    }
    if let Ok(api_key) = std::env::var("GPTUNNEL_API_KEY") {
        if !api_key.trim().is_empty() {
            let model = std::env::var("GPTUNNEL_MODEL").unwrap_or_else(|_| "gpt-4o".to_string());
            return Some(ProviderCredentials::Gptunnel { api_key, model });
        }
    }
    None
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let port = match std::env::var("PORT") {
            Ok(raw) => raw.parse::<u16>().context("PORT is not a valid port number")?,
            Err(_) => 8080,
        };

        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());
        let gateway_base_url = std::env::var("ECOMKASSA_BASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        let defaults = EngineSettings {
            ecomkassa_login: env_or_default("ECOMKASSA_LOGIN"),
            ecomkassa_password: env_or_default("ECOMKASSA_PASSWORD"),
            group_code: env_or_default("ECOMKASSA_GROUP_CODE"),
            inn: env_or_default("COMPANY_INN"),
            sno: std::env::var("COMPANY_SNO")
                .ok()
                .as_deref()
                .and_then(TaxScheme::from_code),
            default_vat: std::env::var("DEFAULT_VAT")
                .ok()
                .as_deref()
                .and_then(TaxClass::from_code),
            company_email: env_or_default("COMPANY_EMAIL"),
            payment_address: env_or_default("PAYMENT_ADDRESS"),
            provider: provider_from_env(),
            ..Default::default()
        };

        Ok(Self {
            port,
            database_url,
            gateway_base_url,
            defaults,
        })
    }
}
