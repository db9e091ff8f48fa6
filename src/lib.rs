/*!
 * # multitrans
 *
 * Parallel multi-provider text translation.
 *
 * ## Features
 *
 * - Sentence-aware segmentation of the input into bounded chunks
 * - Concurrent translation by several providers with a bounded worker pool:
 *   - DeepL (official API, or the keyless public endpoint)
 *   - Google Cloud Translation and Yandex Cloud Translate
 *   - OpenAI-compatible chat APIs (OpenAI, OpenRouter, Groq, LocalAI)
 *   - Anthropic Claude
 * - Per-chunk failure isolation with placeholders in the reassembled text
 * - Glossary substitution on translated output
 * - LLM-based evaluation and ranking of the provider results
 * - SQLite translation history
 *
 * ## Architecture
 *
 * - `app_config`: Configuration management
 * - `providers`: Clients for the translation backends
 * - `translation`: Segmentation, registry, orchestration, glossary and evaluation
 * - `database`: History persistence
 * - `app_controller`: Command line glue
 * - `language_utils`: ISO language code utilities
 * - `errors`: Error types for the application
 */

#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

pub mod app_config;
pub mod app_controller;
pub mod database;
pub mod errors;
pub mod language_utils;
pub mod providers;
pub mod translation;

pub use app_config::Config;
pub use errors::{AppError, EvaluationError, GlossaryError, OrchestrationError, ProviderError};
pub use language_utils::{get_language_name, language_codes_match};
pub use providers::TranslationProvider;
pub use translation::{
    EvaluationResult, Glossary, OrchestrationOptions, OrchestrationReport, ProviderResult, ProviderStatus,
    TranslationOrchestrator, TranslationService,
};
