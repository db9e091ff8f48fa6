/*!
 * DeepL translation client.
 *
 * With an API key the official REST API is used (free or pro host depending
 * on the plan). Without a key the client talks to the public JSON-RPC
 * endpoint used by the DeepL web translator, so the provider is usable out
 * of the box.
 */

use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::app_config::{DeeplPlan, ProviderConfig};
use crate::errors::ProviderError;
use crate::language_utils;
use crate::providers::TranslationProvider;
use crate::providers::http;

pub const FREE_API_URL: &str = "https://api-free.deepl.com/v2/translate";
pub const PRO_API_URL: &str = "https://api.deepl.com/v2/translate";
pub const KEYLESS_API_URL: &str = "https://www2.deepl.com/jsonrpc";

const NAME: &str = "deepl";

/// DeepL language code for an ISO 639-1 code
pub fn deepl_language_code(code: &str) -> Option<&'static str> {
    let primary = language_utils::normalize_to_part1_or_part2t(code)
        .unwrap_or_else(|_| language_utils::primary_subtag(code));
    let deepl = match primary.as_str() {
        "en" => "EN",
        "ru" => "RU",
        "de" => "DE",
        "fr" => "FR",
        "es" => "ES",
        "it" => "IT",
        "nl" => "NL",
        "pl" => "PL",
        "pt" => "PT",
        "zh" => "ZH",
        "ja" => "JA",
        "ko" => "KO",
        "bg" => "BG",
        "cs" => "CS",
        "da" => "DA",
        "el" => "EL",
        "et" => "ET",
        "fi" => "FI",
        "hu" => "HU",
        "id" => "ID",
        "lt" => "LT",
        "lv" => "LV",
        "no" | "nb" => "NB",
        "ro" => "RO",
        "sk" => "SK",
        "sl" => "SL",
        "sv" => "SV",
        "tr" => "TR",
        "uk" => "UK",
        _ => return None,
    };
    Some(deepl)
}

/// Response of the official translate endpoint
#[derive(Debug, Deserialize)]
struct DeepLResponse {
    translations: Vec<DeepLTranslation>,
}

#[derive(Debug, Deserialize)]
struct DeepLTranslation {
    text: String,
}

/// JSON-RPC request of the keyless endpoint
#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'static str,
    id: u64,
    params: JsonRpcParams<'a>,
}

#[derive(Debug, Serialize)]
struct JsonRpcParams<'a> {
    jobs: Vec<JsonRpcJob<'a>>,
    lang: JsonRpcLang<'a>,
    priority: i32,
    timestamp: u64,
}

#[derive(Debug, Serialize)]
struct JsonRpcJob<'a> {
    kind: &'static str,
    raw_en_sentence: &'a str,
}

#[derive(Debug, Serialize)]
struct JsonRpcLang<'a> {
    user_preferred_langs: Vec<&'a str>,
    source_lang_user_selected: &'a str,
    target_lang: &'a str,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    result: Option<JsonRpcResult>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResult {
    #[serde(default)]
    translations: Vec<JsonRpcTranslation>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcTranslation {
    #[serde(default)]
    beams: Vec<JsonRpcBeam>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcBeam {
    #[serde(default)]
    postprocessed_sentence: String,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

/// DeepL client
#[derive(Debug)]
pub struct DeepL {
    client: Client,
    api_key: String,
    plan: DeeplPlan,
    /// Override of the official endpoint
    endpoint: String,
    keyless_endpoint: String,
}

impl DeepL {
    /// Create a new DeepL client; an empty key selects the keyless mode
    pub fn new(api_key: impl Into<String>, plan: DeeplPlan) -> Self {
        Self {
            client: http::build_client(http::DEFAULT_TIMEOUT_SECS),
            api_key: api_key.into(),
            plan,
            endpoint: String::new(),
            keyless_endpoint: KEYLESS_API_URL.to_string(),
        }
    }

    /// Create a client from its configuration entry
    pub fn from_config(config: &ProviderConfig) -> Self {
        Self {
            client: http::build_client(config.timeout_secs),
            api_key: config.api_key.clone(),
            plan: config.plan,
            endpoint: config.endpoint.clone(),
            keyless_endpoint: KEYLESS_API_URL.to_string(),
        }
    }

    /// Override both endpoints, used to point the client at a local server
    pub fn with_endpoints(mut self, endpoint: impl Into<String>, keyless: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self.keyless_endpoint = keyless.into();
        self
    }

    fn api_url(&self) -> &str {
        if !self.endpoint.is_empty() {
            return &self.endpoint;
        }
        match self.plan {
            DeeplPlan::Free => FREE_API_URL,
            DeeplPlan::Pro => PRO_API_URL,
        }
    }

    fn target_code(target_language: &str) -> Result<&'static str, ProviderError> {
        deepl_language_code(target_language).ok_or_else(|| {
            ProviderError::UnsupportedLanguage(format!(
                "DeepL does not support target language: {}",
                target_language
            ))
        })
    }

    async fn translate_with_key(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, ProviderError> {
        let target = Self::target_code(target_language)?;
        let mut params = vec![
            ("text", text),
            ("target_lang", target),
            ("preserve_formatting", "1"),
        ];
        if !language_utils::is_auto(source_language) {
            if let Some(source) = deepl_language_code(source_language) {
                params.push(("source_lang", source));
            }
        }

        let response = self
            .client
            .post(self.api_url())
            .header("Authorization", format!("DeepL-Auth-Key {}", self.api_key))
            .form(&params)
            .send()
            .await
            .map_err(|e| http::map_transport_error("DeepL", e))?;

        let body: DeepLResponse = http::decode_json("DeepL", response).await?;
        body.translations
            .into_iter()
            .next()
            .map(|t| t.text)
            .ok_or_else(|| ProviderError::Malformed("DeepL returned no translations".to_string()))
    }

    /// Request timestamp expected by the keyless endpoint
    fn keyless_timestamp(text: &str) -> u64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        let i_count = text.matches('i').count() as u64;
        if i_count == 0 {
            return now;
        }
        now + (i_count - now % i_count)
    }

    async fn translate_keyless(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, ProviderError> {
        let target = Self::target_code(target_language)?;
        let source = if language_utils::is_auto(source_language) {
            "auto"
        } else {
            deepl_language_code(source_language).unwrap_or("auto")
        };

        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method: "LMT_handle_jobs",
            id: 1,
            params: JsonRpcParams {
                jobs: vec![JsonRpcJob {
                    kind: "default",
                    raw_en_sentence: text,
                }],
                lang: JsonRpcLang {
                    user_preferred_langs: vec!["EN", target],
                    source_lang_user_selected: source,
                    target_lang: target,
                },
                priority: 1,
                timestamp: Self::keyless_timestamp(text),
            },
        };

        debug!("DeepL keyless request: {} chars to {}", text.chars().count(), target);
        let response = self
            .client
            .post(&self.keyless_endpoint)
            .header("User-Agent", "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .json(&request)
            .send()
            .await
            .map_err(|e| http::map_transport_error("DeepL", e))?;

        let body: JsonRpcResponse = http::decode_json("DeepL", response).await?;
        if let Some(error) = body.error {
            warn!("DeepL keyless endpoint error {}: {}", error.code, error.message);
            let message = format!("DeepL keyless error {}: {}", error.code, error.message);
            return Err(if error.message.to_lowercase().contains("too many requests") {
                ProviderError::RateLimit(message)
            } else {
                ProviderError::Network(message)
            });
        }

        let translations = body
            .result
            .map(|r| r.translations)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                ProviderError::Malformed("Unexpected response format from DeepL keyless API".to_string())
            })?;

        Ok(translations
            .into_iter()
            .filter_map(|t| t.beams.into_iter().next())
            .map(|beam| beam.postprocessed_sentence)
            .collect::<Vec<_>>()
            .join(" "))
    }
}

#[async_trait]
impl TranslationProvider for DeepL {
    fn name(&self) -> String {
        NAME.to_string()
    }

    fn display_name(&self) -> String {
        if self.api_key.is_empty() {
            "DeepL (Free)".to_string()
        } else {
            "DeepL".to_string()
        }
    }

    fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    fn supports_keyless_fallback(&self) -> bool {
        true
    }

    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, ProviderError> {
        if self.api_key.is_empty() {
            self.translate_keyless(text, source_language, target_language).await
        } else {
            self.translate_with_key(text, source_language, target_language).await
        }
    }
}
