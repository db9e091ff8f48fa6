/*!
 * End-to-end translation requests.
 *
 * `TranslationService` resolves the requested providers through the
 * registry, runs the orchestrator, applies the glossary to every translated
 * chunk and optionally asks the configured evaluator to rank the results.
 */

use std::sync::Arc;

use log::{info, warn};

use crate::app_config::Config;
use crate::errors::{EvaluationError, GlossaryError, OrchestrationError};

use super::evaluation::{EvaluationCoordinator, EvaluationResult};
use super::glossary::{Glossary, GlossaryApplier, MATCHER_SIZE_LIMIT};
use super::orchestrator::{OrchestrationOptions, OrchestrationReport, TranslationOrchestrator};
use super::registry::{ProviderRegistry, SkippedProvider};

/// One translation request
#[derive(Debug, Clone)]
pub struct TranslationRequest {
    pub text: String,
    pub source_language: String,
    pub target_language: String,
    /// Requested provider names in preference order
    pub providers: Vec<String>,
    /// Whether to run the evaluator on the results
    pub evaluate: bool,
}

impl TranslationRequest {
    pub fn new(text: impl Into<String>, source_language: impl Into<String>, target_language: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source_language: source_language.into(),
            target_language: target_language.into(),
            providers: Vec::new(),
            evaluate: false,
        }
    }

    pub fn with_providers<S: Into<String>>(mut self, providers: impl IntoIterator<Item = S>) -> Self {
        self.providers = providers.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_evaluation(mut self, evaluate: bool) -> Self {
        self.evaluate = evaluate;
        self
    }
}

/// Everything produced for one request
#[derive(Debug, Clone)]
pub struct TranslationOutcome {
    pub report: OrchestrationReport,
    /// Requested providers that did not take part
    pub skipped: Vec<SkippedProvider>,
    /// Number of glossary entries applied; absent for an empty glossary
    pub glossary: Option<Result<usize, GlossaryError>>,
    /// Present when evaluation was requested
    pub evaluation: Option<Result<EvaluationResult, EvaluationError>>,
}

/// Registry, orchestrator, glossary and evaluator behind one call
pub struct TranslationService {
    registry: Arc<ProviderRegistry>,
    orchestrator: TranslationOrchestrator,
    glossary: Glossary,
    glossary_size_limit: usize,
    evaluator: Option<String>,
    options: OrchestrationOptions,
}

impl TranslationService {
    pub fn new(registry: Arc<ProviderRegistry>, glossary: Glossary) -> Self {
        Self {
            registry,
            orchestrator: TranslationOrchestrator::new(),
            glossary,
            glossary_size_limit: MATCHER_SIZE_LIMIT,
            evaluator: None,
            options: OrchestrationOptions::default(),
        }
    }

    /// Build a service with the registry, limits and evaluator from configuration
    pub fn from_config(config: &Config, glossary: Glossary) -> Self {
        Self::new(Arc::new(ProviderRegistry::from_config(config)), glossary)
            .with_options(OrchestrationOptions::from_config(config))
            .with_evaluator(config.evaluator_provider.clone())
    }

    pub fn with_options(mut self, options: OrchestrationOptions) -> Self {
        self.options = options;
        self
    }

    /// Cap the compiled size of the glossary matcher
    pub fn with_glossary_size_limit(mut self, size_limit: usize) -> Self {
        self.glossary_size_limit = size_limit;
        self
    }

    pub fn with_evaluator(mut self, evaluator: Option<String>) -> Self {
        self.evaluator = evaluator.filter(|name| !name.trim().is_empty());
        self
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn glossary(&self) -> &Glossary {
        &self.glossary
    }

    pub fn options(&self) -> &OrchestrationOptions {
        &self.options
    }

    /// Run one request
    pub async fn translate(&self, request: &TranslationRequest) -> Result<TranslationOutcome, OrchestrationError> {
        let selection = self.registry.active_providers(&request.providers);
        for skipped in &selection.skipped {
            warn!("Provider '{}' skipped: {}", skipped.name, skipped.reason);
        }

        let mut report = self
            .orchestrator
            .translate_parallel(
                &request.text,
                &request.source_language,
                &request.target_language,
                &selection.providers,
                &self.options,
            )
            .await?;

        let glossary = (!self.glossary.is_empty()).then(|| -> Result<usize, GlossaryError> {
            let applier = GlossaryApplier::with_size_limit(self.glossary.entries(), self.glossary_size_limit)
                .inspect_err(|e| warn!("Glossary not applied: {}", e))?;
            report.map_translations(|text| applier.apply(text));
            info!("Applied {} glossary entries", self.glossary.len());
            Ok(self.glossary.len())
        });

        let evaluation = if request.evaluate {
            Some(self.evaluate(request, &report).await)
        } else {
            None
        };

        Ok(TranslationOutcome {
            report,
            skipped: selection.skipped,
            glossary,
            evaluation,
        })
    }

    async fn evaluate(
        &self,
        request: &TranslationRequest,
        report: &OrchestrationReport,
    ) -> Result<EvaluationResult, EvaluationError> {
        let name = self
            .evaluator
            .clone()
            .ok_or_else(|| EvaluationError::NotConfigured("no evaluator selected".to_string()))?;
        let evaluator = self
            .registry
            .get(&name)
            .ok_or_else(|| EvaluationError::NotConfigured(name.clone()))?;

        EvaluationCoordinator::new(evaluator)
            .evaluate(
                &request.text,
                &report.usable_translations(),
                &request.source_language,
                &request.target_language,
            )
            .await
    }
}
