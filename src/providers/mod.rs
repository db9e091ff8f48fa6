/*!
 * Provider implementations for different translation services.
 *
 * This module contains client implementations for the supported backends:
 * - DeepL: official API, with a keyless public fallback
 * - Google: Cloud Translation v2
 * - Yandex: Cloud Translate v2
 * - OpenAI-compatible: OpenAI, OpenRouter, Groq and LocalAI chat completions
 * - Anthropic: Claude messages API
 * - Mock: scripted in-process provider for tests and dry runs
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ProviderError;
use crate::language_utils;

/// System prompt shared by the LLM backends
pub const TRANSLATOR_SYSTEM_PROMPT: &str = "You are a professional translator. Provide accurate, natural translations. Only output the translation, nothing else.";

/// Sampling temperature for translation requests
pub const TRANSLATION_TEMPERATURE: f32 = 0.3;

/// Token budget for a single LLM answer
pub const MAX_COMPLETION_TOKENS: u32 = 2000;

/// Build the user prompt asking an LLM to translate `text`
pub fn translation_prompt(text: &str, source_language: &str, target_language: &str) -> String {
    format!(
        "Translate the following text from {} to {}. Be accurate and preserve meaning:\n\n{}",
        language_utils::prompt_language_name(source_language),
        language_utils::prompt_language_name(target_language),
        text
    )
}

/// Common trait for all translation providers
///
/// This trait defines the interface that every backend must follow,
/// allowing them to be used interchangeably by the orchestrator. Implementors
/// are shared across worker tasks and must be safe to call concurrently.
#[async_trait]
pub trait TranslationProvider: Send + Sync + Debug {
    /// Stable identifier used as the key of per-provider results
    fn name(&self) -> String;

    /// Human readable label
    fn display_name(&self) -> String {
        self.name()
    }

    /// Whether the provider has the configuration it needs
    fn is_configured(&self) -> bool;

    /// Whether the provider degrades to an unauthenticated mode when unconfigured
    fn supports_keyless_fallback(&self) -> bool {
        false
    }

    /// Translate text from source language to target language
    ///
    /// # Arguments
    /// * `text` - The text to translate
    /// * `source_language` - Source language code, or `auto`
    /// * `target_language` - Target language code
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, ProviderError>;

    /// Whether `complete` sends free-form prompts to a language model
    fn supports_completion(&self) -> bool {
        false
    }

    /// Complete a free-form prompt
    async fn complete(&self, _prompt: &str) -> Result<String, ProviderError> {
        Err(ProviderError::Unsupported(self.name()))
    }
}

pub mod http;
pub mod deepl;
pub mod google;
pub mod yandex;
pub mod openai;
pub mod anthropic;
pub mod mock;
