/*!
 * OpenAI-compatible chat completions client.
 *
 * One client serves every backend speaking the `/chat/completions`
 * protocol: OpenAI itself, OpenRouter, Groq and self-hosted LocalAI
 * servers. They differ only in endpoint, default model, extra headers and
 * whether an API key is required.
 */

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

/// Title sent to OpenRouter for its app rankings
const OPENROUTER_APP_TITLE: &str = "multitrans";

/// Chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender (system, user, assistant)
    pub role: String,
    /// Content of the message
    pub content: String,
}

/// Chat completions request
#[derive(Debug, Serialize)]
pub struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

impl ChatRequest {
    /// Create a new request for the given model
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            temperature: None,
            max_tokens: None,
        }
    }

    /// Add a message to the request
    pub fn add_message(mut self, role: impl Into<String>, content: impl Into<String>) -> Self {
        self.messages.push(ChatMessage {
            role: role.into(),
            content: content.into(),
        });
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the maximum number of generated tokens
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client for any OpenAI-compatible chat completions API
#[derive(Debug)]
pub struct OpenAICompatible {
    kind: ProviderKind,
    client: Client,
    api_key: String,
    model: String,
    endpoint: String,
    extra_headers: Vec<(String, String)>,
}

impl OpenAICompatible {
    /// Create a client for one of the OpenAI-compatible provider kinds
    pub fn new(
        kind: ProviderKind,
        api_key: impl Into<String>,
        model: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        let extra_headers = match kind {
            ProviderKind::OpenRouter => vec![
                ("HTTP-Referer".to_string(), String::new()),
                ("X-Title".to_string(), OPENROUTER_APP_TITLE.to_string()),
            ],
            _ => Vec::new(),
        };
        Self {
            kind,
            client: http::build_client(http::DEFAULT_TIMEOUT_SECS),
            api_key: api_key.into(),
            model: model.into(),
            endpoint: endpoint.into(),
            extra_headers,
        }
    }

    /// Create a client from its configuration entry
    pub fn from_config(config: &ProviderConfig) -> Self {
        let mut provider = Self::new(
            config.provider_type,
            config.api_key.clone(),
            config.model_or_default(),
            config.endpoint_or_default(),
        );
        provider.client = http::build_client(config.timeout_secs);
        provider
    }

    /// Add a header sent with every request
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.extra_headers.retain(|(existing, _)| *existing != name);
        self.extra_headers.push((name, value.into()));
        self
    }

    /// Model used for requests
    pub fn model(&self) -> &str {
        &self.model
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.endpoint.trim_end_matches('/'))
    }

    /// Send a chat request and return the first choice's content
    pub async fn chat(&self, request: ChatRequest) -> Result<String, ProviderError> {
        let label = self.kind.display_name();
        let mut builder = self.client.post(self.completions_url()).json(&request);

        if !self.api_key.is_empty() {
            builder = builder.bearer_auth(&self.api_key);
        }
        for (name, value) in &self.extra_headers {
            if !value.is_empty() {
                builder = builder.header(name.as_str(), value.as_str());
            }
        }

        debug!("{} chat request with model {}", label, self.model);
        let response = builder
            .send()
            .await
            .map_err(|e| http::map_transport_error(label, e))?;

        let body: ChatResponse = http::decode_json(label, response).await?;
        body.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.unwrap_or_default().trim().to_string())
            .ok_or_else(|| ProviderError::Malformed(format!("{} returned no choices", label)))
    }
}

#[async_trait]
impl TranslationProvider for OpenAICompatible {
    fn name(&self) -> String {
        self.kind.to_lowercase_string()
    }

    fn display_name(&self) -> String {
        format!("{} ({})", self.kind.display_name(), self.model)
    }

    fn is_configured(&self) -> bool {
        match self.kind {
            ProviderKind::LocalAI => !self.endpoint.is_empty(),
            _ => !self.api_key.is_empty(),
        }
    }

    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, ProviderError> {
        if !self.is_configured() {
            return Err(ProviderError::NotConfigured(self.name()));
        }

        let request = ChatRequest::new(&self.model)
            .add_message("system", TRANSLATOR_SYSTEM_PROMPT)
            .add_message("user", translation_prompt(text, source_language, target_language))
            .temperature(TRANSLATION_TEMPERATURE)
            .max_tokens(MAX_COMPLETION_TOKENS);

        self.chat(request).await
    }

    fn supports_completion(&self) -> bool {
        true
    }

    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        if !self.is_configured() {
            return Err(ProviderError::NotConfigured(self.name()));
        }

        let request = ChatRequest::new(&self.model)
            .add_message("user", prompt)
            .temperature(TRANSLATION_TEMPERATURE)
            .max_tokens(MAX_COMPLETION_TOKENS * 2);

        self.chat(request).await
    }
}
