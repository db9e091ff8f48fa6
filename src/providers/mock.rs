/*!
 * Mock provider implementations for testing.
 *
 * This module provides an in-process provider that simulates different behaviors:
 * - `MockProvider::working()` - Always succeeds with translated text
 * - `MockProvider::intermittent(n)` - Fails every n-th request
 * - `MockProvider::failing(kind)` - Always fails with an error of the given kind
 * - `MockProvider::slow(ms)` - Succeeds after a delay
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::errors::{ProviderError, ProviderErrorKind};
use crate::providers::TranslationProvider;

/// Request seen by a custom response generator
#[derive(Debug, Clone)]
pub struct MockRequest {
    /// The text to translate
    pub text: String,
    /// Source language
    pub source_language: String,
    /// Target language
    pub target_language: String,
}

/// Behavior mode for the mock provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds
    Working,
    /// Fails intermittently (every Nth request)
    Intermittent { fail_every: usize },
    /// Always fails with an error of the given kind
    Failing { kind: ProviderErrorKind },
    /// Returns an empty translation
    Empty,
    /// Succeeds after sleeping (for timeout and cancellation testing)
    Slow { delay_ms: u64 },
}

/// Mock provider for testing translation behavior
#[derive(Debug)]
pub struct MockProvider {
    /// Name reported to the orchestrator
    name: String,
    /// Behavior mode
    behavior: MockBehavior,
    /// Request counter shared between clones
    request_count: Arc<AtomicUsize>,
    /// Custom response generator (optional)
    custom_response: Option<fn(&MockRequest) -> String>,
    /// Canned answer for `complete`; completion is unsupported without it
    completion: Option<String>,
    /// Prompts received by `complete`, shared between clones
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            name: "mock".to_string(),
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            custom_response: None,
            completion: None,
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a working mock provider that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create an intermittently failing mock provider
    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent {
            fail_every: fail_every.max(1),
        })
    }

    /// Create a failing mock provider that always errors
    pub fn failing(kind: ProviderErrorKind) -> Self {
        Self::new(MockBehavior::Failing { kind })
    }

    /// Create a mock that returns empty translations
    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    /// Create a mock that answers after a delay
    pub fn slow(delay_ms: u64) -> Self {
        Self::new(MockBehavior::Slow { delay_ms })
    }

    /// Set the provider name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set a custom response generator
    pub fn with_custom_response(mut self, generator: fn(&MockRequest) -> String) -> Self {
        self.custom_response = Some(generator);
        self
    }

    /// Answer every `complete` call with the given text
    pub fn with_completion(mut self, completion: impl Into<String>) -> Self {
        self.completion = Some(completion.into());
        self
    }

    /// Number of translate calls received so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Prompts passed to `complete` so far
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    fn respond(&self, request: &MockRequest) -> String {
        match self.custom_response {
            Some(generator) => generator(request),
            None => format!("[TRANSLATED to {}] {}", request.target_language, request.text),
        }
    }

    fn simulated_error(kind: ProviderErrorKind, detail: String) -> ProviderError {
        match kind {
            ProviderErrorKind::Auth => ProviderError::Auth(detail),
            ProviderErrorKind::Network => ProviderError::Network(detail),
            ProviderErrorKind::RateLimit => ProviderError::RateLimit(detail),
            ProviderErrorKind::Malformed => ProviderError::Malformed(detail),
            ProviderErrorKind::Timeout => ProviderError::Timeout(detail),
            ProviderErrorKind::NotConfigured => ProviderError::NotConfigured(detail),
            ProviderErrorKind::Unsupported => ProviderError::Unsupported(detail),
        }
    }
}

impl Clone for MockProvider {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            behavior: self.behavior,
            request_count: Arc::clone(&self.request_count),
            custom_response: self.custom_response,
            completion: self.completion.clone(),
            prompts: Arc::clone(&self.prompts),
        }
    }
}

#[async_trait]
impl TranslationProvider for MockProvider {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn display_name(&self) -> String {
        format!("Mock ({})", self.name)
    }

    fn is_configured(&self) -> bool {
        true
    }

    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        let request = MockRequest {
            text: text.to_string(),
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
        };

        match self.behavior {
            MockBehavior::Working => Ok(self.respond(&request)),

            MockBehavior::Intermittent { fail_every } => {
                if count % fail_every == fail_every - 1 {
                    Err(ProviderError::Network(format!(
                        "Simulated intermittent failure (request #{})",
                        count + 1
                    )))
                } else {
                    Ok(self.respond(&request))
                }
            }

            MockBehavior::Failing { kind } => Err(Self::simulated_error(
                kind,
                format!("Simulated {} failure in {}", kind, self.name),
            )),

            MockBehavior::Empty => Ok(String::new()),

            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(tokio::time::Duration::from_millis(delay_ms)).await;
                Ok(self.respond(&request))
            }
        }
    }

    fn supports_completion(&self) -> bool {
        self.completion.is_some()
    }

    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        self.prompts.lock().push(prompt.to_string());
        match (&self.completion, self.behavior) {
            (_, MockBehavior::Failing { kind }) => Err(Self::simulated_error(
                kind,
                format!("Simulated {} failure in {}", kind, self.name),
            )),
            (Some(answer), _) => Ok(answer.clone()),
            (None, _) => Err(ProviderError::Unsupported(self.name.clone())),
        }
    }
}
