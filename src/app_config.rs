use anyhow::{Context, Result, anyhow};
use log::warn;
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::{Path, PathBuf};
use url::Url;

use crate::database::DatabaseConnection;
use crate::language_utils;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language code (ISO) or "auto"
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Target language code (ISO)
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Providers to translate with, in display order
    #[serde(default = "default_selected_providers")]
    pub selected_providers: Vec<String>,

    /// Maximum characters per chunk
    #[serde(default = "default_max_chunk_size")]
    pub max_chunk_size: usize,

    /// Size of the translation worker pool
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Deadline for a whole translation call, in seconds
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Provider used to score and merge translations
    #[serde(default)]
    pub evaluator_provider: Option<String>,

    /// Glossary file location
    #[serde(default = "default_glossary_path")]
    pub glossary_path: String,

    /// History database location; the user data directory when unset
    #[serde(default)]
    pub history_path: Option<String>,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Per-provider credentials and settings
    #[serde(default = "default_provider_configs")]
    pub providers: Vec<ProviderConfig>,
}

/// Translation provider type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    DeepL,
    Google,
    Yandex,
    OpenAI,
    OpenRouter,
    Groq,
    Claude,
    LocalAI,
    Mock,
}

impl ProviderKind {
    /// All provider kinds that talk to a real service
    pub const REMOTE: [ProviderKind; 8] = [
        Self::DeepL,
        Self::Google,
        Self::Yandex,
        Self::OpenAI,
        Self::OpenRouter,
        Self::Groq,
        Self::Claude,
        Self::LocalAI,
    ];

    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::DeepL => "DeepL",
            Self::Google => "Google Translate",
            Self::Yandex => "Yandex Translate",
            Self::OpenAI => "OpenAI",
            Self::OpenRouter => "OpenRouter",
            Self::Groq => "Groq",
            Self::Claude => "Claude",
            Self::LocalAI => "LocalAI",
            Self::Mock => "Mock",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::DeepL => "deepl".to_string(),
            Self::Google => "google".to_string(),
            Self::Yandex => "yandex".to_string(),
            Self::OpenAI => "openai".to_string(),
            Self::OpenRouter => "openrouter".to_string(),
            Self::Groq => "groq".to_string(),
            Self::Claude => "claude".to_string(),
            Self::LocalAI => "localai".to_string(),
            Self::Mock => "mock".to_string(),
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "deepl" => Ok(Self::DeepL),
            "google" => Ok(Self::Google),
            "yandex" => Ok(Self::Yandex),
            "openai" => Ok(Self::OpenAI),
            "openrouter" => Ok(Self::OpenRouter),
            "groq" => Ok(Self::Groq),
            "claude" | "anthropic" => Ok(Self::Claude),
            "localai" => Ok(Self::LocalAI),
            "mock" => Ok(Self::Mock),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// DeepL subscription plan, selecting the API host
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeeplPlan {
    #[default]
    Free,
    Pro,
}

/// Provider configuration wrapper
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    // @field: Provider type identifier
    #[serde(rename = "type")]
    pub provider_type: ProviderKind,

    // @field: API key
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Model name (LLM providers only)
    #[serde(default = "String::new")]
    pub model: String,

    // @field: Service URL override
    #[serde(default = "String::new")]
    pub endpoint: String,

    // @field: DeepL plan
    #[serde(default)]
    pub plan: DeeplPlan,

    // @field: Timeout seconds per request
    #[serde(default = "default_request_timeout_secs")]
    pub timeout_secs: u64,
}

impl ProviderConfig {
    // @param provider_type: Provider enum
    // @returns: Provider config with defaults
    pub fn new(provider_type: ProviderKind) -> Self {
        let (model, endpoint) = match provider_type {
            ProviderKind::OpenAI => (default_openai_model(), default_openai_endpoint()),
            ProviderKind::OpenRouter => (default_openrouter_model(), default_openrouter_endpoint()),
            ProviderKind::Groq => (default_groq_model(), default_groq_endpoint()),
            ProviderKind::Claude => (default_claude_model(), default_claude_endpoint()),
            ProviderKind::LocalAI => (default_localai_model(), String::new()),
            _ => (String::new(), String::new()),
        };

        Self {
            provider_type,
            api_key: String::new(),
            model,
            endpoint,
            plan: DeeplPlan::default(),
            timeout_secs: default_request_timeout_secs(),
        }
    }

    /// Set the API key
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    /// Set the endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Model name, falling back to the provider default when unset
    pub fn model_or_default(&self) -> String {
        if !self.model.is_empty() {
            return self.model.clone();
        }
        ProviderConfig::new(self.provider_type).model
    }

    /// Endpoint, falling back to the provider default when unset
    pub fn endpoint_or_default(&self) -> String {
        if !self.endpoint.is_empty() {
            return self.endpoint.clone();
        }
        ProviderConfig::new(self.provider_type).endpoint
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Convert to the `log` crate filter
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

pub const MIN_CHUNK_SIZE: usize = 1;
pub const MAX_CHUNK_SIZE: usize = 20_000;
pub const MIN_WORKERS: usize = 1;
pub const MAX_WORKERS: usize = 32;

fn default_source_language() -> String {
    language_utils::AUTO.to_string()
}

fn default_target_language() -> String {
    "ru".to_string()
}

fn default_selected_providers() -> Vec<String> {
    vec!["deepl".to_string()]
}

fn default_max_chunk_size() -> usize {
    1000
}

fn default_max_workers() -> usize {
    3
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_glossary_path() -> String {
    "glossary.json".to_string()
}

fn default_openai_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openrouter_endpoint() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

fn default_groq_endpoint() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_claude_endpoint() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_openai_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_openrouter_model() -> String {
    "openai/gpt-3.5-turbo".to_string()
}

fn default_groq_model() -> String {
    "mixtral-8x7b-32768".to_string()
}

fn default_claude_model() -> String {
    "claude-3-sonnet-20240229".to_string()
}

fn default_localai_model() -> String {
    "default".to_string()
}

fn default_provider_configs() -> Vec<ProviderConfig> {
    ProviderKind::REMOTE.iter().copied().map(ProviderConfig::new).collect()
}

impl Config {
    /// Load a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load a configuration file, writing the defaults when it does not exist
    pub fn load_or_create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Self::load(path);
        }

        warn!("Config file not found at '{}', creating default config.", path.display());
        let config = Config::default();
        config.save(path)?;
        Ok(config)
    }

    /// Save the configuration as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config to file: {}", path.display()))
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        language_utils::validate_source_language_code(&self.source_language)
            .context("Invalid source language")?;
        language_utils::validate_language_code(&self.target_language)
            .context("Invalid target language")?;

        if !(MIN_CHUNK_SIZE..=MAX_CHUNK_SIZE).contains(&self.max_chunk_size) {
            return Err(anyhow!(
                "Chunk size must be between {} and {}, got {}",
                MIN_CHUNK_SIZE,
                MAX_CHUNK_SIZE,
                self.max_chunk_size
            ));
        }

        if !(MIN_WORKERS..=MAX_WORKERS).contains(&self.max_workers) {
            return Err(anyhow!(
                "Workers must be between {} and {}, got {}",
                MIN_WORKERS,
                MAX_WORKERS,
                self.max_workers
            ));
        }

        if self.timeout_secs == Some(0) {
            return Err(anyhow!("Timeout must be at least one second"));
        }

        for provider in &self.providers {
            if !provider.endpoint.is_empty() {
                Url::parse(&provider.endpoint).with_context(|| {
                    format!("Invalid endpoint for provider {}: {}", provider.provider_type, provider.endpoint)
                })?;
            }
        }

        Ok(())
    }

    /// Get a specific provider configuration by type
    pub fn provider_config(&self, kind: ProviderKind) -> Option<&ProviderConfig> {
        self.providers.iter().find(|p| p.provider_type == kind)
    }

    /// Mutable access to a provider configuration, inserting defaults when absent
    pub fn provider_config_mut(&mut self, kind: ProviderKind) -> &mut ProviderConfig {
        if let Some(index) = self.providers.iter().position(|p| p.provider_type == kind) {
            return &mut self.providers[index];
        }
        self.providers.push(ProviderConfig::new(kind));
        let last = self.providers.len() - 1;
        &mut self.providers[last]
    }

    /// Resolved history database path, falling back to the user data directory
    pub fn history_database_path(&self) -> Result<PathBuf> {
        match self.history_path.as_deref().map(str::trim) {
            Some(path) if !path.is_empty() => Ok(PathBuf::from(path)),
            _ => DatabaseConnection::default_database_path(),
        }
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: default_source_language(),
            target_language: default_target_language(),
            selected_providers: default_selected_providers(),
            max_chunk_size: default_max_chunk_size(),
            max_workers: default_max_workers(),
            timeout_secs: None,
            evaluator_provider: None,
            glossary_path: default_glossary_path(),
            history_path: None,
            log_level: LogLevel::default(),
            providers: default_provider_configs(),
        }
    }
}
