//! Per-request engine configuration.
//!
//! Settings arrive with each request (the UI stores them client-side)
//! and are merged over environment defaults once, at the edge. The
//! merged [`EngineSettings`] object is passed explicitly through every
//! call; nothing deeper does ambient credential lookups.

use serde::{Deserialize, Serialize};

use super::draft::{MerchantContext, TaxClass, TaxScheme};

/// Credentials for the active completion provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "id", rename_all = "snake_case")]
pub enum ProviderCredentials {
    /// Sber GigaChat: OAuth auth key exchanged for a short-lived
    /// bearer token before each call.
    Gigachat { auth_key: String },

    /// YandexGPT: static API key scoped to a cloud folder.
    Yandexgpt { api_key: String, folder_id: String },

    /// OpenAI-compatible GPTunnel relay, model-selectable.
    #[serde(alias = "gptunnel_chatgpt", alias = "gptunnel_claude")]
    Gptunnel { api_key: String, model: String },
}

/// Everything one request needs: merchant credentials, fiscal
/// defaults, and the active completion provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Fiscal gateway account. All three must be present for a real
    /// (non-demo) submission.
    #[serde(default)]
    pub ecomkassa_login: String,
    #[serde(default)]
    pub ecomkassa_password: String,
    #[serde(default)]
    pub group_code: String,

    #[serde(default)]
    pub inn: String,

    /// Taxation scheme; absent falls through to the server default,
    /// then to [`TaxScheme::default`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sno: Option<TaxScheme>,

    /// VAT class applied to items the extractor left unclassified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_vat: Option<TaxClass>,
    #[serde(default)]
    pub company_email: String,
    #[serde(default)]
    pub payment_address: String,

    /// Active completion provider, if any. Absence is not an error:
    /// the deterministic fallback extractor runs instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderCredentials>,

    /// Accumulated text of prior incomplete requests in this
    /// conversation (multi-turn continuation).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub context_message: String,
}

impl EngineSettings {
    /// Merge request-supplied settings over environment defaults.
    ///
    /// Non-empty request fields win; empty strings fall through to
    /// the default. The provider is taken from the request when set.
    pub fn merged(defaults: &EngineSettings, request: EngineSettings) -> EngineSettings {
        fn pick(req: String, def: &str) -> String {
            if req.trim().is_empty() {
                def.to_string()
            } else {
                req
            }
        }

        EngineSettings {
            ecomkassa_login: pick(request.ecomkassa_login, &defaults.ecomkassa_login),
            ecomkassa_password: pick(request.ecomkassa_password, &defaults.ecomkassa_password),
            group_code: pick(request.group_code, &defaults.group_code),
            inn: pick(request.inn, &defaults.inn),
            sno: request.sno.or(defaults.sno),
            default_vat: request.default_vat.or(defaults.default_vat),
            company_email: pick(request.company_email, &defaults.company_email),
            payment_address: pick(request.payment_address, &defaults.payment_address),
            provider: request.provider.or_else(|| defaults.provider.clone()),
            context_message: request.context_message,
        }
    }

    /// True when all fiscal gateway credentials are present.
    pub fn has_merchant_credentials(&self) -> bool {
        !self.ecomkassa_login.trim().is_empty()
            && !self.ecomkassa_password.trim().is_empty()
            && !self.group_code.trim().is_empty()
    }

    /// Merchant fields carried into every draft.
    pub fn merchant_context(&self) -> MerchantContext {
        MerchantContext {
            inn: self.inn.clone(),
            sno: self.sno.unwrap_or_default(),
            company_email: self.company_email.clone(),
            payment_address: self.payment_address.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_fields_override_defaults() {
        let defaults = EngineSettings {
            ecomkassa_login: "env-login".into(),
            company_email: "env@firm.ru".into(),
            ..Default::default()
        };
        let request = EngineSettings {
            ecomkassa_login: "user-login".into(),
            ..Default::default()
        };
        let merged = EngineSettings::merged(&defaults, request);
        assert_eq!(merged.ecomkassa_login, "user-login");
        assert_eq!(merged.company_email, "env@firm.ru");
    }

    #[test]
    fn enum_defaults_survive_a_request_that_omits_them() {
        let defaults = EngineSettings {
            sno: Some(TaxScheme::Osn),
            default_vat: Some(TaxClass::Vat20),
            ..Default::default()
        };
        let merged = EngineSettings::merged(&defaults, EngineSettings::default());
        assert_eq!(merged.sno, Some(TaxScheme::Osn));
        assert_eq!(merged.default_vat, Some(TaxClass::Vat20));
        assert_eq!(merged.merchant_context().sno, TaxScheme::Osn);

        let request = EngineSettings {
            sno: Some(TaxScheme::Patent),
            ..Default::default()
        };
        let merged = EngineSettings::merged(&defaults, request);
        assert_eq!(merged.sno, Some(TaxScheme::Patent));
    }

    #[test]
    fn provider_tag_deserializes() {
        let json = r#"{"id": "yandexgpt", "api_key": "k", "folder_id": "f"}"#;
        let creds: ProviderCredentials = serde_json::from_str(json).unwrap();
        assert_eq!(
            creds,
            ProviderCredentials::Yandexgpt {
                api_key: "k".into(),
                folder_id: "f".into()
            }
        );
    }

    #[test]
    fn credentials_require_all_three_fields() {
        let mut settings = EngineSettings {
            ecomkassa_login: "l".into(),
            ecomkassa_password: "p".into(),
            ..Default::default()
        };
        assert!(!settings.has_merchant_credentials());
        settings.group_code = "shop_1".into();
        assert!(settings.has_merchant_credentials());
    }
}
