/*!
 * Registry of instantiated translation providers.
 *
 * The registry is built from configuration and answers which of the
 * requested providers can take part in a translation. A provider is active
 * when it is configured or when it can fall back to an unauthenticated mode.
 * Requested providers that are unknown or unusable are reported as skipped.
 */

use std::str::FromStr;
use std::sync::Arc;

use log::{debug, warn};

use crate::app_config::{Config, ProviderConfig, ProviderKind};
use crate::errors::RegistryError;
use crate::providers::TranslationProvider;
use crate::providers::anthropic::Anthropic;
use crate::providers::deepl::DeepL;
use crate::providers::google::Google;
use crate::providers::mock::MockProvider;
use crate::providers::openai::OpenAICompatible;
use crate::providers::yandex::Yandex;

/// A requested provider that will not take part in a translation
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedProvider {
    /// Name as requested
    pub name: String,
    /// Why it was skipped
    pub reason: RegistryError,
}

/// Outcome of resolving requested provider names
#[derive(Debug, Clone, Default)]
pub struct ProviderSelection {
    /// Active providers in request order
    pub providers: Vec<Arc<dyn TranslationProvider>>,
    /// Requested providers that were unavailable
    pub skipped: Vec<SkippedProvider>,
}

impl ProviderSelection {
    /// Names of the active providers
    pub fn names(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

/// Build a provider instance for one configuration entry
pub fn build_provider(config: &ProviderConfig) -> Arc<dyn TranslationProvider> {
    match config.provider_type {
        ProviderKind::DeepL => Arc::new(DeepL::from_config(config)),
        ProviderKind::Google => Arc::new(Google::from_config(config)),
        ProviderKind::Yandex => Arc::new(Yandex::from_config(config)),
        ProviderKind::OpenAI | ProviderKind::OpenRouter | ProviderKind::Groq | ProviderKind::LocalAI => {
            Arc::new(OpenAICompatible::from_config(config))
        }
        ProviderKind::Claude => Arc::new(Anthropic::from_config(config)),
        ProviderKind::Mock => Arc::new(MockProvider::working()),
    }
}

/// Holds the known providers in registration order
#[derive(Debug, Default)]
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn TranslationProvider>>,
}

impl ProviderRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build every remote provider, using configured entries where present
    ///
    /// A `mock` entry in the configuration registers the mock provider too.
    pub fn from_config(config: &Config) -> Self {
        let mut registry = Self::new();
        for kind in ProviderKind::REMOTE {
            let provider_config = config
                .provider_config(kind)
                .cloned()
                .unwrap_or_else(|| ProviderConfig::new(kind));
            registry.register(build_provider(&provider_config));
        }
        if let Some(mock) = config.provider_config(ProviderKind::Mock) {
            registry.register(build_provider(mock));
        }
        debug!("Provider registry built with {} providers", registry.providers.len());
        registry
    }

    /// Register a provider, replacing any provider with the same name
    pub fn register(&mut self, provider: Arc<dyn TranslationProvider>) {
        let name = provider.name();
        match self.providers.iter().position(|p| p.name() == name) {
            Some(index) => self.providers[index] = provider,
            None => self.providers.push(provider),
        }
    }

    /// Builder-style registration
    pub fn with_provider(mut self, provider: Arc<dyn TranslationProvider>) -> Self {
        self.register(provider);
        self
    }

    /// All registered providers
    pub fn providers(&self) -> &[Arc<dyn TranslationProvider>] {
        &self.providers
    }

    /// Find a provider by name, accepting kind aliases such as `anthropic`
    pub fn get(&self, name: &str) -> Option<Arc<dyn TranslationProvider>> {
        let wanted = Self::canonical_name(name);
        self.providers.iter().find(|p| p.name() == wanted).cloned()
    }

    /// Whether a provider can take part in a translation
    pub fn is_usable(provider: &dyn TranslationProvider) -> bool {
        provider.is_configured() || provider.supports_keyless_fallback()
    }

    /// Providers that are usable right now
    pub fn available(&self) -> Vec<Arc<dyn TranslationProvider>> {
        self.providers
            .iter()
            .filter(|p| Self::is_usable(p.as_ref()))
            .cloned()
            .collect()
    }

    /// Resolve requested names to the active providers
    ///
    /// Duplicate names are ignored; the order of first appearance is kept.
    pub fn active_providers<S: AsRef<str>>(&self, requested: &[S]) -> ProviderSelection {
        let mut selection = ProviderSelection::default();
        let mut seen: Vec<String> = Vec::new();

        for requested_name in requested {
            let requested_name = requested_name.as_ref().trim();
            let canonical = Self::canonical_name(requested_name);
            if seen.contains(&canonical) {
                continue;
            }
            seen.push(canonical.clone());

            match self.providers.iter().find(|p| p.name() == canonical) {
                None => {
                    warn!("Skipping unknown provider '{}'", requested_name);
                    selection.skipped.push(SkippedProvider {
                        name: requested_name.to_string(),
                        reason: RegistryError::UnknownProvider(requested_name.to_string()),
                    });
                }
                Some(provider) if !Self::is_usable(provider.as_ref()) => {
                    warn!("Skipping provider '{}': not configured", canonical);
                    selection.skipped.push(SkippedProvider {
                        name: requested_name.to_string(),
                        reason: RegistryError::NotConfigured(canonical.clone()),
                    });
                }
                Some(provider) => selection.providers.push(Arc::clone(provider)),
            }
        }

        selection
    }

    fn canonical_name(name: &str) -> String {
        ProviderKind::from_str(name)
            .map(|kind| kind.to_lowercase_string())
            .unwrap_or_else(|_| name.trim().to_lowercase())
    }
}
