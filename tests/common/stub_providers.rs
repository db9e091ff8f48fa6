/*!
 * Stub providers for orchestration tests
 *
 * Every stub is deterministic in what it returns; some vary how long they
 * take so completion order differs from dispatch order.
 */

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use multitrans::errors::ProviderError;
use multitrans::providers::TranslationProvider;

/// Uppercases the input
#[derive(Debug, Default)]
pub struct UpperProvider;

#[async_trait]
impl TranslationProvider for UpperProvider {
    fn name(&self) -> String {
        "upper".to_string()
    }

    fn is_configured(&self) -> bool {
        true
    }

    async fn translate(&self, text: &str, _source: &str, _target: &str) -> Result<String, ProviderError> {
        Ok(text.to_uppercase())
    }
}

/// Reverses the input character by character
#[derive(Debug, Default)]
pub struct ReverseProvider;

#[async_trait]
impl TranslationProvider for ReverseProvider {
    fn name(&self) -> String {
        "rev".to_string()
    }

    fn is_configured(&self) -> bool {
        true
    }

    async fn translate(&self, text: &str, _source: &str, _target: &str) -> Result<String, ProviderError> {
        Ok(text.chars().rev().collect())
    }
}

/// Wraps the input in brackets after a latency that changes from call to call
///
/// Also records how many calls were in flight at the same time.
#[derive(Debug)]
pub struct LatencyProvider {
    name: String,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl LatencyProvider {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TranslationProvider for LatencyProvider {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn is_configured(&self) -> bool {
        true
    }

    async fn translate(&self, text: &str, _source: &str, _target: &str) -> Result<String, ProviderError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        // later calls finish first on every other call
        let delay = if call % 2 == 0 { 30 - (call % 7) as u64 * 3 } else { 2 + (call % 5) as u64 };
        tokio::time::sleep(Duration::from_millis(delay)).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(format!("<{}>", text.trim_end()))
    }
}

/// Fails every chunk containing `needle`, echoes the others
#[derive(Debug)]
pub struct SelectiveFailureProvider {
    pub needle: String,
}

#[async_trait]
impl TranslationProvider for SelectiveFailureProvider {
    fn name(&self) -> String {
        "selective".to_string()
    }

    fn is_configured(&self) -> bool {
        true
    }

    async fn translate(&self, text: &str, _source: &str, _target: &str) -> Result<String, ProviderError> {
        if text.contains(&self.needle) {
            Err(ProviderError::Malformed(format!("cannot handle '{}'", self.needle)))
        } else {
            Ok(text.to_string())
        }
    }
}

/// Always fails with an authentication error
#[derive(Debug, Default)]
pub struct BrokenProvider;

#[async_trait]
impl TranslationProvider for BrokenProvider {
    fn name(&self) -> String {
        "broken".to_string()
    }

    fn is_configured(&self) -> bool {
        true
    }

    async fn translate(&self, _text: &str, _source: &str, _target: &str) -> Result<String, ProviderError> {
        Err(ProviderError::Auth("invalid key".to_string()))
    }
}

/// Sleeps for a fixed time before echoing
#[derive(Debug)]
pub struct SleepyProvider {
    pub delay: Duration,
}

#[async_trait]
impl TranslationProvider for SleepyProvider {
    fn name(&self) -> String {
        "sleepy".to_string()
    }

    fn is_configured(&self) -> bool {
        true
    }

    async fn translate(&self, text: &str, _source: &str, _target: &str) -> Result<String, ProviderError> {
        tokio::time::sleep(self.delay).await;
        Ok(text.to_string())
    }
}

/// Shared handle helpers
pub fn upper() -> Arc<dyn TranslationProvider> {
    Arc::new(UpperProvider)
}

pub fn rev() -> Arc<dyn TranslationProvider> {
    Arc::new(ReverseProvider)
}
