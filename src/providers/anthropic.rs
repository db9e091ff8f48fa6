use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::app_config::{ProviderConfig, ProviderKind};
use crate::errors::ProviderError;
use crate::providers::http;
use crate::providers::{
    MAX_COMPLETION_TOKENS, TRANSLATION_TEMPERATURE, TRANSLATOR_SYSTEM_PROMPT, TranslationProvider,
    translation_prompt,
};

const NAME: &str = "claude";
const API_VERSION: &str = "2023-06-01";

/// Anthropic client for interacting with the Claude messages API
#[derive(Debug)]
pub struct Anthropic {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// Model name
    model: String,
    /// API endpoint URL (empty selects the public API)
    endpoint: String,
}

/// Anthropic message request
#[derive(Debug, Serialize)]
pub struct AnthropicRequest {
    /// The model to use
    model: String,

    /// The messages for the conversation
    messages: Vec<AnthropicMessage>,

    /// System prompt to guide the AI
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,

    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,

    /// Maximum number of tokens to generate
    max_tokens: u32,
}

/// Anthropic message format
#[derive(Debug, Serialize, Deserialize)]
pub struct AnthropicMessage {
    /// Role of the message sender (user, assistant)
    pub role: String,

    /// Content of the message
    pub content: String,
}

/// Anthropic response
#[derive(Debug, Deserialize)]
pub struct AnthropicResponse {
    /// The content of the response
    #[serde(default)]
    pub content: Vec<AnthropicContent>,
}

/// Individual content block in an Anthropic response
#[derive(Debug, Deserialize)]
pub struct AnthropicContent {
    /// The type of content
    #[serde(rename = "type")]
    pub content_type: String,

    /// The actual text content
    #[serde(default)]
    pub text: String,
}

impl AnthropicRequest {
    /// Create a new Anthropic request
    pub fn new(model: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            system: None,
            temperature: None,
            max_tokens,
        }
    }

    /// Add a message to the request
    pub fn add_message(mut self, role: impl Into<String>, content: impl Into<String>) -> Self {
        self.messages.push(AnthropicMessage {
            role: role.into(),
            content: content.into(),
        });
        self
    }

    /// Set the system prompt
    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

impl Anthropic {
    /// Create a new Anthropic client
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            client: http::build_client(http::DEFAULT_TIMEOUT_SECS),
            api_key: api_key.into(),
            model: model.into(),
            endpoint: endpoint.into(),
        }
    }

    /// Create a client from its configuration entry
    pub fn from_config(config: &ProviderConfig) -> Self {
        Self {
            client: http::build_client(config.timeout_secs),
            api_key: config.api_key.clone(),
            model: config.model_or_default(),
            endpoint: config.endpoint_or_default(),
        }
    }

    fn messages_url(&self) -> String {
        if self.endpoint.is_empty() {
            "https://api.anthropic.com/v1/messages".to_string()
        } else {
            format!("{}/v1/messages", self.endpoint.trim_end_matches('/'))
        }
    }

    /// Send a messages request
    pub async fn send(&self, request: AnthropicRequest) -> Result<AnthropicResponse, ProviderError> {
        debug!("Claude request with model {}", self.model);
        let response = self
            .client
            .post(self.messages_url())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| http::map_transport_error("Claude", e))?;

        http::decode_json("Claude", response).await
    }

    /// Extract text from Anthropic response
    pub fn extract_text_from_response(response: &AnthropicResponse) -> String {
        response
            .content
            .iter()
            .filter(|c| c.content_type == "text")
            .map(|c| c.text.as_str())
            .collect::<String>()
            .trim()
            .to_string()
    }

    async fn send_for_text(&self, request: AnthropicRequest) -> Result<String, ProviderError> {
        if !self.is_configured() {
            return Err(ProviderError::NotConfigured(NAME.to_string()));
        }
        let response = self.send(request).await?;
        if response.content.is_empty() {
            return Err(ProviderError::Malformed("Claude returned no content".to_string()));
        }
        Ok(Self::extract_text_from_response(&response))
    }
}

#[async_trait]
impl TranslationProvider for Anthropic {
    fn name(&self) -> String {
        NAME.to_string()
    }

    fn display_name(&self) -> String {
        format!("{} ({})", ProviderKind::Claude.display_name(), self.model)
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
        let request = AnthropicRequest::new(&self.model, MAX_COMPLETION_TOKENS)
            .system(TRANSLATOR_SYSTEM_PROMPT)
            .temperature(TRANSLATION_TEMPERATURE)
            .add_message("user", translation_prompt(text, source_language, target_language));
        self.send_for_text(request).await
    }

    fn supports_completion(&self) -> bool {
        true
    }

    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let request = AnthropicRequest::new(&self.model, MAX_COMPLETION_TOKENS * 2)
            .temperature(TRANSLATION_TEMPERATURE)
            .add_message("user", prompt);
        self.send_for_text(request).await
    }
}
