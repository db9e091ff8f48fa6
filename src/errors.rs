/*!
 * Error types for the multitrans library.
 *
 * This module contains custom error types for the different layers of the
 * translation engine, using the thiserror crate for ergonomic error definitions.
 * Task-level provider errors are captured into results; only configuration
 * errors abort an orchestration call.
 */

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coarse classification of a provider failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderErrorKind {
    Auth,
    Network,
    RateLimit,
    Malformed,
    Timeout,
    NotConfigured,
    Unsupported,
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Auth => "auth",
            Self::Network => "network",
            Self::RateLimit => "rate_limit",
            Self::Malformed => "malformed",
            Self::Timeout => "timeout",
            Self::NotConfigured => "not_configured",
            Self::Unsupported => "unsupported",
        };
        write!(f, "{}", label)
    }
}

/// Errors that can occur when calling a translation provider
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum ProviderError {
    /// Credentials were missing, invalid or rejected
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Transport failure or non-success HTTP status
    #[error("Network error: {0}")]
    Network(String),

    /// Provider refused the request because of quota or request rate
    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    /// Response could not be decoded or lacked the expected fields
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// Request did not finish in time
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Provider was invoked without the configuration it needs
    #[error("Provider '{0}' is not configured")]
    NotConfigured(String),

    /// Provider does not offer the requested capability
    #[error("Provider '{0}' does not support this operation")]
    Unsupported(String),

    /// Provider cannot translate from or into the requested language
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),
}

impl ProviderError {
    /// Get the kind of this error
    pub fn kind(&self) -> ProviderErrorKind {
        match self {
            Self::Auth(_) => ProviderErrorKind::Auth,
            Self::Network(_) => ProviderErrorKind::Network,
            Self::RateLimit(_) => ProviderErrorKind::RateLimit,
            Self::Malformed(_) => ProviderErrorKind::Malformed,
            Self::Timeout(_) => ProviderErrorKind::Timeout,
            Self::NotConfigured(_) => ProviderErrorKind::NotConfigured,
            Self::Unsupported(_) | Self::UnsupportedLanguage(_) => ProviderErrorKind::Unsupported,
        }
    }
}

/// Errors raised by the text segmenter for invalid configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SegmentationError {
    #[error("Invalid chunk size {0}: must be at least 1")]
    InvalidChunkSize(usize),
}

/// Errors from glossary editing and persistence
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GlossaryError {
    #[error("Glossary source and target terms must be non-empty")]
    EmptyTerm,

    #[error("Failed to access glossary file {path}: {message}")]
    Io { path: String, message: String },

    #[error("Invalid glossary file {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Failed to build glossary matcher: {0}")]
    Pattern(String),
}

/// Reasons a requested provider cannot take part in a translation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("Provider '{0}' is not configured")]
    NotConfigured(String),
}

/// Errors that abort an evaluation request
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluationError {
    /// The evaluator provider failed to answer
    #[error("Evaluator provider failed: {0}")]
    ProviderFailure(#[from] ProviderError),

    /// The evaluator answered but the structured output was unusable
    #[error("Failed to parse evaluation response: {0}")]
    ParseFailure(String),

    #[error("Evaluator '{0}' is not configured or cannot complete prompts")]
    NotConfigured(String),

    #[error("No translations provided for evaluation")]
    NoCandidates,
}

/// Configuration-level failures of an orchestration call
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OrchestrationError {
    #[error("Segmentation error: {0}")]
    Segmentation(#[from] SegmentationError),

    #[error("No providers available for translation")]
    NoProviders,

    #[error("Invalid worker count {0}: must be at least 1")]
    InvalidWorkerCount(usize),

    /// The blocking entry point could not start its runtime
    #[error("Failed to start async runtime: {0}")]
    Runtime(String),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Orchestration error: {0}")]
    Orchestration(#[from] OrchestrationError),

    #[error("Evaluation error: {0}")]
    Evaluation(#[from] EvaluationError),

    #[error("Glossary error: {0}")]
    Glossary(#[from] GlossaryError),

    #[error("Configuration error: {0}")]
    Config(String),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
