/*!
 * Application controller.
 *
 * Glue between the command line and the library: builds the translation
 * service from configuration, drives the progress bar, persists history and
 * renders results for the terminal.
 */

use std::fmt::Write as _;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};

use crate::app_config::Config;
use crate::database::{HistoryRecord, HistoryRepository};
use crate::translation::evaluation::EvaluationResult;
use crate::translation::glossary::{Glossary, GlossaryEntry, GlossaryStore};
use crate::translation::orchestrator::{CancellationHandle, OrchestrationOptions, ProviderStatus};
use crate::translation::registry::ProviderRegistry;
use crate::translation::service::{TranslationOutcome, TranslationRequest, TranslationService};

/// Number of characters shown when listing history entries
const PREVIEW_CHARS: usize = 60;

/// One row of the provider listing
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderInfo {
    pub name: String,
    pub display_name: String,
    pub configured: bool,
    pub keyless: bool,
    pub selected: bool,
    pub can_evaluate: bool,
}

/// Main application controller
pub struct Controller {
    config: Config,
    registry: Arc<ProviderRegistry>,
    history: Option<HistoryRepository>,
    show_progress: bool,
}

impl Controller {
    /// Create a controller from a validated configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;
        let registry = Arc::new(ProviderRegistry::from_config(&config));
        Ok(Self {
            config,
            registry,
            history: None,
            show_progress: true,
        })
    }

    /// Replace the provider registry built from configuration
    pub fn with_registry(mut self, registry: Arc<ProviderRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Use the given history repository instead of the configured database
    pub fn with_history(mut self, history: HistoryRepository) -> Self {
        self.history = Some(history);
        self
    }

    pub fn with_progress_bar(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Read the text to translate from a file, or from stdin for `None` and `-`
    pub fn read_input(path: Option<&Path>) -> Result<String> {
        match path {
            Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read input file: {}", path.display())),
            _ => {
                let mut text = String::new();
                std::io::stdin()
                    .read_to_string(&mut text)
                    .context("Failed to read text from stdin")?;
                Ok(text)
            }
        }
    }

    fn glossary_store(&self) -> GlossaryStore {
        GlossaryStore::new(&self.config.glossary_path)
    }

    fn history(&self) -> Result<HistoryRepository> {
        if let Some(history) = &self.history {
            return Ok(history.clone());
        }
        let path = self.config.history_database_path()?;
        let db = crate::database::DatabaseConnection::new(&path)?;
        Ok(HistoryRepository::new(db))
    }

    fn progress_bar(&self) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} tasks ({percent}%) {msg}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style.progress_chars("█▓▒░"));
        bar
    }

    /// Translate `text` with the selected providers
    pub async fn translate(
        &self,
        text: &str,
        evaluate: bool,
        save_history: bool,
        cancellation: CancellationHandle,
    ) -> Result<TranslationOutcome> {
        let glossary = self.glossary_store().load()?;

        let bar = self.progress_bar();
        bar.set_message(self.config.selected_providers.join(", "));
        let progress_bar = bar.clone();
        let options = OrchestrationOptions::from_config(&self.config)
            .with_progress(move |done, total| {
                progress_bar.set_length(total as u64);
                progress_bar.set_position(done as u64);
            })
            .with_cancellation(cancellation);
        let service = TranslationService::new(Arc::clone(&self.registry), glossary)
            .with_options(options)
            .with_evaluator(self.config.evaluator_provider.clone());

        info!(
            "Translating {} -> {} with {}",
            self.config.source_language,
            self.config.target_language,
            self.config.selected_providers.join(", ")
        );

        let request = TranslationRequest::new(text, &self.config.source_language, &self.config.target_language)
            .with_providers(self.config.selected_providers.iter().cloned())
            .with_evaluation(evaluate);
        let outcome = service.translate(&request).await;
        bar.finish_and_clear();
        let outcome = outcome?;

        info!(
            "Finished {} tasks in {}",
            outcome.report.total_tasks,
            Self::format_duration(outcome.report.elapsed)
        );

        if save_history {
            self.save_history(&request, &outcome).await;
        }

        Ok(outcome)
    }

    async fn save_history(&self, request: &TranslationRequest, outcome: &TranslationOutcome) {
        let evaluation = outcome.evaluation.as_ref().and_then(|e| e.as_ref().ok()).cloned();
        let record = HistoryRecord::new(
            &request.source_language,
            &request.target_language,
            &request.text,
            outcome.report.results.clone(),
            evaluation,
        );
        let stored = match self.history() {
            Ok(history) => history.append(&record).await,
            Err(e) => Err(e),
        };
        match stored {
            Ok(()) => info!("Saved to history as {}", record.id),
            Err(e) => warn!("Failed to save translation history: {:#}", e),
        }
    }

    /// Render a translation outcome for the terminal
    pub fn render_outcome(outcome: &TranslationOutcome) -> String {
        let mut out = String::new();
        let chunks = outcome.report.chunk_count();

        for result in &outcome.report.results {
            let status = match result.status {
                ProviderStatus::Partial => format!(
                    "partial, {} of {} chunks untranslated",
                    chunks - result.outcomes.iter().filter(|o| o.is_success()).count(),
                    chunks
                ),
                status => status.to_string(),
            };
            let _ = writeln!(out, "=== {} ({}) ===", result.provider, status);
            let _ = writeln!(out, "{}", result.text);
            let _ = writeln!(out);
        }

        for skipped in &outcome.skipped {
            let _ = writeln!(out, "Skipped {}: {}", skipped.name, skipped.reason);
        }
        if outcome.report.timed_out {
            let _ = writeln!(out, "Time limit reached before every task finished");
        }
        if outcome.report.cancelled {
            let _ = writeln!(out, "Cancelled before every task finished");
        }
        if let Some(Err(e)) = &outcome.glossary {
            let _ = writeln!(out, "Glossary not applied: {}", e);
        }

        match &outcome.evaluation {
            Some(Ok(evaluation)) => out.push_str(&Self::render_evaluation(evaluation)),
            Some(Err(e)) => {
                let _ = writeln!(out, "Evaluation failed: {}", e);
            }
            None => {}
        }

        out
    }

    fn render_evaluation(evaluation: &EvaluationResult) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "=== Evaluation by {} ===", evaluation.evaluator);
        for item in &evaluation.evaluations {
            let marker = if item.provider == evaluation.best_provider { "*" } else { " " };
            let _ = writeln!(out, "{} {}: {:.1}/10 {}", marker, item.provider, item.score, item.rationale);
        }
        let _ = writeln!(out, "Best: {}", evaluation.best_provider);
        let _ = writeln!(out);
        let _ = writeln!(out, "=== Improved translation ===");
        let _ = writeln!(out, "{}", evaluation.improved_translation);
        out
    }

    /// Every registered provider with its readiness
    pub fn providers(&self) -> Vec<ProviderInfo> {
        let selected: Vec<String> = self
            .registry
            .active_providers(&self.config.selected_providers)
            .names();
        self.registry
            .providers()
            .iter()
            .map(|p| ProviderInfo {
                name: p.name(),
                display_name: p.display_name(),
                configured: p.is_configured(),
                keyless: !p.is_configured() && p.supports_keyless_fallback(),
                selected: selected.contains(&p.name()),
                can_evaluate: p.supports_completion(),
            })
            .collect()
    }

    pub fn render_providers(providers: &[ProviderInfo]) -> String {
        let mut out = String::new();
        for info in providers {
            let state = if info.configured {
                "configured"
            } else if info.keyless {
                "keyless"
            } else {
                "not configured"
            };
            let _ = writeln!(
                out,
                "{} {:<12} {:<24} {}{}",
                if info.selected { "*" } else { " " },
                info.name,
                info.display_name,
                state,
                if info.can_evaluate { ", can evaluate" } else { "" }
            );
        }
        out
    }

    pub fn glossary_entries(&self) -> Result<Glossary> {
        Ok(self.glossary_store().load()?)
    }

    /// Add or replace a glossary entry and save the glossary file
    pub fn glossary_add(&self, source: &str, target: &str, case_sensitive: bool) -> Result<Option<GlossaryEntry>> {
        let store = self.glossary_store();
        let mut glossary = store.load()?;
        let replaced = glossary.add(GlossaryEntry::new(source, target, case_sensitive))?;
        store.save(&glossary)?;
        Ok(replaced)
    }

    /// Remove a glossary entry, failing when it does not exist
    pub fn glossary_remove(&self, source: &str) -> Result<GlossaryEntry> {
        let store = self.glossary_store();
        let mut glossary = store.load()?;
        let removed = glossary
            .remove(source)
            .ok_or_else(|| anyhow!("No glossary entry for '{}'", source))?;
        store.save(&glossary)?;
        Ok(removed)
    }

    pub fn render_glossary(glossary: &Glossary) -> String {
        let mut out = String::new();
        for entry in glossary.entries() {
            let _ = writeln!(
                out,
                "{} => {}{}",
                entry.source,
                entry.target,
                if entry.case_sensitive { " (case-sensitive)" } else { "" }
            );
        }
        out
    }

    pub async fn history_list(&self, limit: usize) -> Result<Vec<HistoryRecord>> {
        self.history()?.list(limit).await
    }

    pub async fn history_show(&self, id: &str) -> Result<HistoryRecord> {
        self.history()?
            .get(id)
            .await?
            .ok_or_else(|| anyhow!("No history record with id {}", id))
    }

    pub async fn history_clear(&self) -> Result<usize> {
        self.history()?.clear().await
    }

    pub fn render_history_list(records: &[HistoryRecord]) -> String {
        let mut out = String::new();
        for record in records {
            let _ = writeln!(
                out,
                "{}  {}  {} -> {}  [{}]  {}",
                record.id,
                record.created_at,
                record.source_language,
                record.target_language,
                record.provider_names().join(", "),
                record.preview(PREVIEW_CHARS)
            );
        }
        out
    }

    pub fn render_history_record(record: &HistoryRecord) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Id: {}", record.id);
        let _ = writeln!(out, "Date: {}", record.created_at);
        let _ = writeln!(out, "Languages: {} -> {}", record.source_language, record.target_language);
        let _ = writeln!(out);
        let _ = writeln!(out, "=== Original ===");
        let _ = writeln!(out, "{}", record.original_text);
        let _ = writeln!(out);
        for result in &record.results {
            let _ = writeln!(out, "=== {} ({}) ===", result.provider, result.status);
            let _ = writeln!(out, "{}", result.text);
            let _ = writeln!(out);
        }
        if let Some(evaluation) = &record.evaluation {
            out.push_str(&Self::render_evaluation(evaluation));
        }
        out
    }

    fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
