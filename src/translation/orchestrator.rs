/*!
 * Parallel fan-out/fan-in translation across providers.
 *
 * The orchestrator splits the source text into chunks, spawns one task per
 * (chunk, provider) pair and bounds the number of provider calls in flight
 * with a semaphore sized by `max_workers`. Results are collected over a
 * channel and reassembled strictly by chunk index, so the output never
 * depends on completion order.
 *
 * Provider failures are captured per task and never abort the call. Only
 * configuration problems (no providers, zero workers, zero chunk size)
 * are returned as errors.
 */

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::{Semaphore, mpsc};

use crate::app_config::Config;
use crate::errors::{OrchestrationError, ProviderError};
use crate::providers::TranslationProvider;

use super::segmenter::{Chunk, TextSegmenter};

/// Placeholder text for a chunk whose task was cancelled
pub const CANCELLED_PLACEHOLDER: &str = "[Cancelled]";

/// Placeholder text for a chunk whose task failed
pub fn error_placeholder(error: &ProviderError) -> String {
    format!("[Error: {}]", error)
}

/// Progress sink receiving (completed, total) task counts
pub type ProgressCallback = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// Shared flag used to stop dispatching new tasks
#[derive(Debug, Clone, Default)]
pub struct CancellationHandle(Arc<AtomicBool>);

impl CancellationHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; tasks already calling a provider still finish
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Options for one orchestration call
#[derive(Clone)]
pub struct OrchestrationOptions {
    /// Maximum number of provider calls in flight
    pub max_workers: usize,
    /// Maximum chunk size in characters
    pub max_chunk_size: usize,
    /// Deadline for the whole call
    pub timeout: Option<Duration>,
    /// Optional progress sink
    pub progress: Option<ProgressCallback>,
    /// Optional cancellation flag
    pub cancellation: Option<CancellationHandle>,
}

impl Default for OrchestrationOptions {
    fn default() -> Self {
        Self {
            max_workers: 3,
            max_chunk_size: 1000,
            timeout: None,
            progress: None,
            cancellation: None,
        }
    }
}

impl fmt::Debug for OrchestrationOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrchestrationOptions")
            .field("max_workers", &self.max_workers)
            .field("max_chunk_size", &self.max_chunk_size)
            .field("timeout", &self.timeout)
            .field("progress", &self.progress.is_some())
            .field("cancellation", &self.cancellation)
            .finish()
    }
}

impl OrchestrationOptions {
    pub fn new(max_workers: usize, max_chunk_size: usize) -> Self {
        Self {
            max_workers,
            max_chunk_size,
            ..Self::default()
        }
    }

    /// Worker, chunk size and timeout limits from configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            timeout: config.timeout_secs.map(Duration::from_secs),
            ..Self::new(config.max_workers, config.max_chunk_size)
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_progress(mut self, progress: impl Fn(usize, usize) + Send + Sync + 'static) -> Self {
        self.progress = Some(Arc::new(progress));
        self
    }

    pub fn with_cancellation(mut self, cancellation: CancellationHandle) -> Self {
        self.cancellation = Some(cancellation);
        self
    }
}

/// Final state of one (chunk, provider) task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "value", rename_all = "snake_case")]
pub enum TaskOutcome {
    Success(String),
    Failure(ProviderError),
    Cancelled,
}

impl TaskOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// A failed chunk of one provider's result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkError {
    pub chunk_index: usize,
    pub error: ProviderError,
}

/// Overall status of a provider result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderStatus {
    /// Every chunk translated
    Complete,
    /// Some chunks translated
    Partial,
    /// No chunk translated
    Failed,
}

impl fmt::Display for ProviderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Complete => "complete",
            Self::Partial => "partial",
            Self::Failed => "failed",
        };
        write!(f, "{}", label)
    }
}

/// Reassembled outcome of one provider across the whole text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderResult {
    /// Provider name
    pub provider: String,
    /// Chunk outputs joined in index order, with placeholders for failures
    pub text: String,
    /// Failed chunks in index order
    pub errors: Vec<ChunkError>,
    /// Per-chunk outcomes in index order
    pub outcomes: Vec<TaskOutcome>,
    pub status: ProviderStatus,
}

impl ProviderResult {
    /// Build a result from per-chunk outcomes
    pub fn from_outcomes(provider: impl Into<String>, chunks: &[Chunk], outcomes: Vec<TaskOutcome>) -> Self {
        let text = reassemble(chunks, &outcomes);
        let errors = outcomes
            .iter()
            .enumerate()
            .filter_map(|(chunk_index, outcome)| match outcome {
                TaskOutcome::Failure(error) => Some(ChunkError {
                    chunk_index,
                    error: error.clone(),
                }),
                _ => None,
            })
            .collect();
        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        let status = if succeeded == outcomes.len() {
            ProviderStatus::Complete
        } else if succeeded > 0 {
            ProviderStatus::Partial
        } else {
            ProviderStatus::Failed
        };

        Self {
            provider: provider.into(),
            text,
            errors,
            outcomes,
            status,
        }
    }

    /// Indices of chunks that were never dispatched because of cancellation
    pub fn cancelled_chunks(&self) -> Vec<usize> {
        self.outcomes
            .iter()
            .enumerate()
            .filter(|(_, o)| matches!(o, TaskOutcome::Cancelled))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.status == ProviderStatus::Complete
    }
}

/// Join chunk outputs in index order
///
/// When an output lost the trailing whitespace its source chunk had, that
/// whitespace is put back so paragraph breaks survive.
pub fn reassemble(chunks: &[Chunk], outcomes: &[TaskOutcome]) -> String {
    let mut text = String::new();
    for (chunk, outcome) in chunks.iter().zip(outcomes) {
        let piece = match outcome {
            TaskOutcome::Success(translated) => translated.clone(),
            TaskOutcome::Failure(error) => error_placeholder(error),
            TaskOutcome::Cancelled => CANCELLED_PLACEHOLDER.to_string(),
        };
        text.push_str(&piece);
        let trailing = chunk.trailing_whitespace();
        if !trailing.is_empty() && !piece.ends_with(char::is_whitespace) {
            text.push_str(trailing);
        }
    }
    text
}

/// Results of one orchestration call, in provider order
#[derive(Debug, Clone)]
pub struct OrchestrationReport {
    pub results: Vec<ProviderResult>,
    /// Source chunks the results were built from
    pub chunks: Vec<Chunk>,
    pub total_tasks: usize,
    pub cancelled: bool,
    pub timed_out: bool,
    pub elapsed: Duration,
}

impl OrchestrationReport {
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Rewrite every successful chunk output and rebuild the result texts
    ///
    /// Placeholders of failed or cancelled chunks are left untouched.
    pub fn map_translations(&mut self, f: impl Fn(&str) -> String) {
        for result in &mut self.results {
            let outcomes = result
                .outcomes
                .iter()
                .map(|outcome| match outcome {
                    TaskOutcome::Success(text) => TaskOutcome::Success(f(text)),
                    other => other.clone(),
                })
                .collect();
            *result = ProviderResult::from_outcomes(result.provider.clone(), &self.chunks, outcomes);
        }
    }

    /// Result of one provider by name
    pub fn get(&self, provider: &str) -> Option<&ProviderResult> {
        self.results.iter().find(|r| r.provider == provider)
    }

    /// (provider name, text) pairs of results with at least one translated chunk
    pub fn usable_translations(&self) -> Vec<(String, String)> {
        self.results
            .iter()
            .filter(|r| r.status != ProviderStatus::Failed)
            .map(|r| (r.provider.clone(), r.text.clone()))
            .collect()
    }
}

/// Message sent from a task to the collector
type TaskMessage = (usize, usize, TaskOutcome);

/// Fan-out/fan-in translation engine
pub struct TranslationOrchestrator {
    segmenter: TextSegmenter,
}

impl Default for TranslationOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl TranslationOrchestrator {
    pub fn new() -> Self {
        Self {
            segmenter: TextSegmenter::new(),
        }
    }

    /// Use a custom segmenter
    pub fn with_segmenter(segmenter: TextSegmenter) -> Self {
        Self { segmenter }
    }

    /// Translate `text` with every provider in parallel
    pub async fn translate_parallel(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
        providers: &[Arc<dyn TranslationProvider>],
        options: &OrchestrationOptions,
    ) -> Result<OrchestrationReport, OrchestrationError> {
        if providers.is_empty() {
            return Err(OrchestrationError::NoProviders);
        }
        if options.max_workers == 0 {
            return Err(OrchestrationError::InvalidWorkerCount(options.max_workers));
        }

        let started = Instant::now();
        let chunks = Arc::new(self.segmenter.segment_language(
            text,
            source_language,
            options.max_chunk_size,
        )?);
        let total = chunks.len() * providers.len();
        info!(
            "Translating {} chunks with {} providers ({} tasks, {} workers)",
            chunks.len(),
            providers.len(),
            total,
            options.max_workers
        );

        let semaphore = Arc::new(Semaphore::new(options.max_workers));
        let cancellation = options.cancellation.clone().unwrap_or_default();
        let expired = Arc::new(AtomicBool::new(false));
        let (tx, mut rx) = mpsc::unbounded_channel::<TaskMessage>();

        for chunk_index in 0..chunks.len() {
            for (provider_index, provider) in providers.iter().enumerate() {
                let provider = Arc::clone(provider);
                let chunks = Arc::clone(&chunks);
                let semaphore = Arc::clone(&semaphore);
                let cancellation = cancellation.clone();
                let expired = Arc::clone(&expired);
                let tx = tx.clone();
                let source_language = source_language.to_string();
                let target_language = target_language.to_string();

                tokio::spawn(async move {
                    let Ok(_permit) = semaphore.acquire_owned().await else {
                        let _ = tx.send((provider_index, chunk_index, TaskOutcome::Cancelled));
                        return;
                    };
                    if cancellation.is_cancelled() || expired.load(Ordering::SeqCst) {
                        let _ = tx.send((provider_index, chunk_index, TaskOutcome::Cancelled));
                        return;
                    }

                    let chunk = &chunks[chunk_index];
                    debug!("{} translating chunk {}", provider.name(), chunk_index);
                    let outcome = match provider
                        .translate(&chunk.text, &source_language, &target_language)
                        .await
                    {
                        Ok(translated) => TaskOutcome::Success(translated),
                        Err(error) => TaskOutcome::Failure(error),
                    };
                    let _ = tx.send((provider_index, chunk_index, outcome));
                });
            }
        }
        drop(tx);

        let mut outcomes: Vec<Vec<Option<TaskOutcome>>> = vec![vec![None; chunks.len()]; providers.len()];
        let mut completed = 0;
        let mut timed_out = false;
        let deadline = options.timeout.map(|timeout| tokio::time::Instant::now() + timeout);

        loop {
            let message = match deadline {
                Some(deadline) => match tokio::time::timeout_at(deadline, rx.recv()).await {
                    Ok(message) => message,
                    Err(_) => {
                        timed_out = true;
                        expired.store(true, Ordering::SeqCst);
                        break;
                    }
                },
                None => rx.recv().await,
            };
            let Some((provider_index, chunk_index, outcome)) = message else {
                break;
            };

            match &outcome {
                TaskOutcome::Failure(error) => warn!(
                    "{} failed on chunk {}: {}",
                    providers[provider_index].name(),
                    chunk_index,
                    error
                ),
                TaskOutcome::Cancelled => debug!(
                    "{} chunk {} cancelled",
                    providers[provider_index].name(),
                    chunk_index
                ),
                TaskOutcome::Success(_) => debug!(
                    "{} finished chunk {}",
                    providers[provider_index].name(),
                    chunk_index
                ),
            }

            outcomes[provider_index][chunk_index] = Some(outcome);
            completed += 1;
            if let Some(progress) = &options.progress {
                progress(completed, total);
            }
        }

        if timed_out {
            warn!(
                "Translation deadline reached with {} of {} tasks finished",
                completed, total
            );
        }

        let mut swept = false;
        for (provider_index, provider_outcomes) in outcomes.iter_mut().enumerate() {
            for slot in provider_outcomes.iter_mut().filter(|slot| slot.is_none()) {
                let error = if timed_out {
                    let seconds = options.timeout.map(|t| t.as_secs_f64()).unwrap_or_default();
                    ProviderError::Timeout(format!("deadline of {:.1}s exceeded", seconds))
                } else {
                    ProviderError::Network(format!(
                        "{} task ended without a result",
                        providers[provider_index].name()
                    ))
                };
                *slot = Some(TaskOutcome::Failure(error));
                swept = true;
            }
        }
        if swept {
            if let Some(progress) = &options.progress {
                progress(total, total);
            }
        }

        let results: Vec<ProviderResult> = providers
            .iter()
            .zip(outcomes)
            .map(|(provider, provider_outcomes)| {
                let provider_outcomes = provider_outcomes.into_iter().flatten().collect();
                ProviderResult::from_outcomes(provider.name(), &chunks, provider_outcomes)
            })
            .collect();

        let report = OrchestrationReport {
            results,
            chunks: chunks.as_ref().clone(),
            total_tasks: total,
            cancelled: cancellation.is_cancelled(),
            timed_out,
            elapsed: started.elapsed(),
        };

        for result in &report.results {
            info!(
                "{}: {} ({} failed chunks)",
                result.provider,
                result.status,
                result.errors.len()
            );
        }
        info!("Translation finished in {:.2}s", report.elapsed.as_secs_f64());

        Ok(report)
    }

    /// Blocking variant of `translate_parallel`
    ///
    /// Builds a multi-threaded runtime for the call, so it must not be used
    /// from inside an async context.
    pub fn translate_parallel_blocking(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
        providers: &[Arc<dyn TranslationProvider>],
        options: &OrchestrationOptions,
    ) -> Result<OrchestrationReport, OrchestrationError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(options.max_workers.max(1))
            .enable_all()
            .build()
            .map_err(|e| OrchestrationError::Runtime(e.to_string()))?;

        let report = runtime.block_on(self.translate_parallel(
            text,
            source_language,
            target_language,
            providers,
            options,
        ));
        runtime.shutdown_background();
        report
    }
}
