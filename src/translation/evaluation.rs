/*!
 * LLM-based evaluation of competing translations.
 *
 * The coordinator sends one prompt with the original text and every
 * candidate translation to an LLM-capable provider and expects a JSON
 * answer with a score and rationale per candidate, the best candidate and
 * an improved translation. Evaluation is all-or-nothing: any malformed or
 * incomplete answer fails the whole request.
 */

use std::sync::Arc;

use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::EvaluationError;
use crate::language_utils;
use crate::providers::TranslationProvider;

use super::segmenter::StructuralMarkers;

/// Lowest and highest accepted score
pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 10.0;

/// Script dialogue lines such as `eileen "Hello there."`
static DIALOGUE_PATTERN: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r#"(?m)^\s*\w+\s+["'].*?["']"#).ok());

/// Whether the text carries structure the evaluator must keep verbatim
pub fn has_structural_tokens(text: &str) -> bool {
    let dialogue = DIALOGUE_PATTERN
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(text));
    dialogue || StructuralMarkers::default().contains_marker(text)
}

/// Label that identifies a candidate in the prompt
pub fn candidate_label(provider: &str) -> String {
    format!("[[provider:{}]]", provider)
}

/// Score and rationale for one candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderEvaluation {
    pub provider: String,
    pub score: f64,
    pub rationale: String,
}

/// Outcome of one evaluation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Name of the evaluating provider
    pub evaluator: String,
    /// One entry per candidate, in candidate order
    pub evaluations: Vec<ProviderEvaluation>,
    pub best_provider: String,
    pub improved_translation: String,
}

impl EvaluationResult {
    pub fn score(&self, provider: &str) -> Option<f64> {
        self.evaluations
            .iter()
            .find(|e| e.provider == provider)
            .map(|e| e.score)
    }

    pub fn rationale(&self, provider: &str) -> Option<&str> {
        self.evaluations
            .iter()
            .find(|e| e.provider == provider)
            .map(|e| e.rationale.as_str())
    }
}

#[derive(Debug, Deserialize)]
struct RawResponse {
    evaluations: Vec<RawEvaluation>,
    best_provider: String,
    improved_translation: String,
}

#[derive(Debug, Deserialize)]
struct RawEvaluation {
    provider: String,
    score: f64,
    #[serde(default)]
    rationale: String,
}

/// Strip Markdown code fences and surrounding prose from a model answer
fn extract_json(raw: &str) -> &str {
    let mut body = raw.trim();
    if let Some(rest) = body.strip_prefix("```") {
        body = rest.strip_prefix("json").unwrap_or(rest);
        body = body.trim_end();
        body = body.strip_suffix("```").unwrap_or(body);
        body = body.trim();
    }
    match (body.find('{'), body.rfind('}')) {
        (Some(start), Some(end)) if start < end => &body[start..=end],
        _ => body,
    }
}

/// Accept `deepl` as well as `[[provider:deepl]]`
fn normalize_provider(name: &str) -> &str {
    let name = name.trim();
    name.strip_prefix("[[provider:")
        .and_then(|rest| rest.strip_suffix("]]"))
        .unwrap_or(name)
        .trim()
}

/// Build the evaluation prompt
pub fn build_prompt(
    original_text: &str,
    candidates: &[(String, String)],
    source_language: &str,
    target_language: &str,
) -> String {
    let mut prompt = format!(
        "You are a professional translation quality evaluator.\n\n\
         Evaluate the following translations of a text from {} to {}. \
         Score each translation from 0 to 10 for accuracy, fluency and naturalness, \
         explain each score in one or two sentences, choose the best translation \
         and write an improved translation that combines the strengths of the candidates.\n\n",
        language_utils::prompt_language_name(source_language),
        language_utils::prompt_language_name(target_language),
    );

    prompt.push_str("[[original]]\n");
    prompt.push_str(original_text);
    prompt.push_str("\n\n");
    for (provider, translation) in candidates {
        prompt.push_str(&candidate_label(provider));
        prompt.push('\n');
        prompt.push_str(translation);
        prompt.push_str("\n\n");
    }

    prompt.push_str("Requirements for the improved translation:\n- Preserve the exact meaning\n- Maximize naturalness and fluency\n");
    if has_structural_tokens(original_text) {
        prompt.push_str(
            "- CRITICAL: Preserve all structural tokens verbatim: dialogue markers, character names, \
             indentation and every <<...>> marker\n",
        );
    }

    let names: Vec<&str> = candidates.iter().map(|(p, _)| p.as_str()).collect();
    prompt.push_str(&format!(
        "\nRespond with JSON only, using exactly this schema:\n\
         {{\"evaluations\":[{{\"provider\":\"<name>\",\"score\":<0-10>,\"rationale\":\"<text>\"}}],\
         \"best_provider\":\"<name>\",\"improved_translation\":\"<text>\"}}\n\
         Include exactly one evaluation for each of: {}.",
        names.join(", ")
    ));
    prompt
}

/// Parse an evaluator answer against the candidate list
pub fn parse_response(
    raw: &str,
    candidates: &[(String, String)],
    evaluator: &str,
) -> Result<EvaluationResult, EvaluationError> {
    let parsed: RawResponse = serde_json::from_str(extract_json(raw))
        .map_err(|e| EvaluationError::ParseFailure(format!("invalid JSON: {}", e)))?;

    let mut evaluations: Vec<Option<ProviderEvaluation>> = vec![None; candidates.len()];
    for item in parsed.evaluations {
        let provider = normalize_provider(&item.provider);
        let index = candidates
            .iter()
            .position(|(name, _)| name == provider)
            .ok_or_else(|| EvaluationError::ParseFailure(format!("unknown provider '{}'", provider)))?;
        if evaluations[index].is_some() {
            return Err(EvaluationError::ParseFailure(format!(
                "provider '{}' evaluated more than once",
                provider
            )));
        }
        if !item.score.is_finite() {
            return Err(EvaluationError::ParseFailure(format!("invalid score for '{}'", provider)));
        }
        evaluations[index] = Some(ProviderEvaluation {
            provider: provider.to_string(),
            score: item.score.clamp(MIN_SCORE, MAX_SCORE),
            rationale: item.rationale.trim().to_string(),
        });
    }

    let evaluations = evaluations
        .into_iter()
        .zip(candidates)
        .map(|(evaluation, (name, _))| {
            evaluation.ok_or_else(|| EvaluationError::ParseFailure(format!("missing evaluation for '{}'", name)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let best_provider = normalize_provider(&parsed.best_provider).to_string();
    if !candidates.iter().any(|(name, _)| *name == best_provider) {
        return Err(EvaluationError::ParseFailure(format!(
            "best provider '{}' is not a candidate",
            best_provider
        )));
    }

    let improved_translation = parsed.improved_translation.trim().to_string();
    if improved_translation.is_empty() {
        return Err(EvaluationError::ParseFailure("improved translation is empty".to_string()));
    }

    Ok(EvaluationResult {
        evaluator: evaluator.to_string(),
        evaluations,
        best_provider,
        improved_translation,
    })
}

/// Runs evaluations through one LLM-capable provider
#[derive(Debug, Clone)]
pub struct EvaluationCoordinator {
    evaluator: Arc<dyn TranslationProvider>,
}

impl EvaluationCoordinator {
    pub fn new(evaluator: Arc<dyn TranslationProvider>) -> Self {
        Self { evaluator }
    }

    pub fn evaluator_name(&self) -> String {
        self.evaluator.name()
    }

    /// Evaluate candidate translations of `original_text`
    pub async fn evaluate(
        &self,
        original_text: &str,
        candidates: &[(String, String)],
        source_language: &str,
        target_language: &str,
    ) -> Result<EvaluationResult, EvaluationError> {
        if candidates.is_empty() {
            return Err(EvaluationError::NoCandidates);
        }
        let name = self.evaluator.name();
        if !self.evaluator.is_configured() || !self.evaluator.supports_completion() {
            return Err(EvaluationError::NotConfigured(name));
        }

        let prompt = build_prompt(original_text, candidates, source_language, target_language);
        info!("Evaluating {} translations with {}", candidates.len(), name);
        debug!("Evaluation prompt has {} chars", prompt.chars().count());

        let answer = self.evaluator.complete(&prompt).await?;
        parse_response(&answer, candidates, &name).inspect_err(|e| {
            warn!("Discarding evaluation from {}: {}", name, e);
        })
    }
}
