/*!
 * Yandex Cloud Translate (v2) client.
 */

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::app_config::ProviderConfig;
use crate::errors::ProviderError;
use crate::language_utils;
use crate::providers::TranslationProvider;
use crate::providers::http;

pub const API_URL: &str = "https://translate.api.cloud.yandex.net/translate/v2/translate";

const NAME: &str = "yandex";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct YandexRequest<'a> {
    texts: Vec<&'a str>,
    target_language_code: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_language_code: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct YandexResponse {
    #[serde(default)]
    translations: Vec<YandexTranslation>,
}

#[derive(Debug, Deserialize)]
struct YandexTranslation {
    text: String,
}

/// Yandex Translate client
#[derive(Debug)]
pub struct Yandex {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl Yandex {
    /// Create a new Yandex client
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: http::build_client(http::DEFAULT_TIMEOUT_SECS),
            api_key: api_key.into(),
            endpoint: API_URL.to_string(),
        }
    }

    /// Create a client from its configuration entry
    pub fn from_config(config: &ProviderConfig) -> Self {
        let endpoint = if config.endpoint.is_empty() {
            API_URL.to_string()
        } else {
            config.endpoint.clone()
        };
        Self {
            client: http::build_client(config.timeout_secs),
            api_key: config.api_key.clone(),
            endpoint,
        }
    }
}

#[async_trait]
impl TranslationProvider for Yandex {
    fn name(&self) -> String {
        NAME.to_string()
    }

    fn display_name(&self) -> String {
        "Yandex Translate".to_string()
    }

    fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, ProviderError> {
        if !self.is_configured() {
            return Err(ProviderError::NotConfigured(NAME.to_string()));
        }

        let request = YandexRequest {
            texts: vec![text],
            target_language_code: target_language,
            source_language_code: (!language_utils::is_auto(source_language)).then_some(source_language),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Api-Key {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| http::map_transport_error("Yandex", e))?;

        let body: YandexResponse = http::decode_json("Yandex", response).await?;
        body.translations
            .into_iter()
            .next()
            .map(|t| t.text)
            .ok_or_else(|| ProviderError::Malformed("Yandex returned no translations".to_string()))
    }
}
