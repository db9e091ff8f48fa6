/*!
 * Google Cloud Translation (v2) client.
 */

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::app_config::ProviderConfig;
use crate::errors::ProviderError;
use crate::language_utils;
use crate::providers::TranslationProvider;
use crate::providers::http;

pub const API_URL: &str = "https://translation.googleapis.com/language/translate/v2";

const NAME: &str = "google";

#[derive(Debug, Deserialize)]
struct GoogleResponse {
    data: GoogleData,
}

#[derive(Debug, Deserialize)]
struct GoogleData {
    translations: Vec<GoogleTranslation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleTranslation {
    translated_text: String,
}

/// Google Translate client
#[derive(Debug)]
pub struct Google {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl Google {
    /// Create a new Google client
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

    /// Build the query parameters for one request
    fn query<'a>(&'a self, text: &'a str, source_language: &'a str, target_language: &'a str) -> Vec<(&'static str, &'a str)> {
        let mut params = vec![
            ("q", text),
            ("target", target_language),
            ("format", "text"),
            ("key", self.api_key.as_str()),
        ];
        if !language_utils::is_auto(source_language) {
            params.push(("source", source_language));
        }
        params
    }
}

#[async_trait]
impl TranslationProvider for Google {
    fn name(&self) -> String {
        NAME.to_string()
    }

    fn display_name(&self) -> String {
        "Google Translate".to_string()
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

        let response = self
            .client
            .post(&self.endpoint)
            .query(&self.query(text, source_language, target_language))
            .send()
            .await
            .map_err(|e| http::map_transport_error("Google", e))?;

        let body: GoogleResponse = http::decode_json("Google", response).await?;
        body.data
            .translations
            .into_iter()
            .next()
            .map(|t| t.translated_text)
            .ok_or_else(|| ProviderError::Malformed("Google returned no translations".to_string()))
    }
}
