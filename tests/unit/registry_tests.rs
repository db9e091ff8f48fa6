/*!
 * Tests for provider registration and selection
 */

use std::sync::Arc;

use multitrans::app_config::{Config, ProviderKind};
use multitrans::errors::RegistryError;
use multitrans::translation::registry::ProviderRegistry;

use crate::common::stub_providers::{BrokenProvider, upper};

#[test]
fn test_activeProviders_shouldKeepRequestOrder() {
    let registry = ProviderRegistry::new()
        .with_provider(upper())
        .with_provider(Arc::new(BrokenProvider));

    let selection = registry.active_providers(&["broken", "upper"]);
    assert_eq!(selection.names(), vec!["broken", "upper"]);
    assert!(!selection.is_empty());
}

#[test]
fn test_activeProviders_withNothingUsable_shouldBeEmpty() {
    let registry = ProviderRegistry::from_config(&Config::default());

    let selection = registry.active_providers(&["google", "claude", "nope"]);
    assert!(selection.is_empty());
    assert_eq!(
        selection.skipped.iter().map(|s| s.reason.clone()).collect::<Vec<_>>(),
        vec![
            RegistryError::NotConfigured("google".to_string()),
            RegistryError::NotConfigured("claude".to_string()),
            RegistryError::UnknownProvider("nope".to_string()),
        ]
    );
}

#[test]
fn test_fromConfig_withKeys_shouldActivateConfiguredProviders() {
    let mut config = Config::default();
    config.provider_config_mut(ProviderKind::Yandex).api_key = "y".to_string();
    config.provider_config_mut(ProviderKind::Claude).api_key = "c".to_string();
    let registry = ProviderRegistry::from_config(&config);

    let available: Vec<String> = registry.available().iter().map(|p| p.name()).collect();
    assert_eq!(available, vec!["deepl", "yandex", "claude"]);

    let claude = registry.get("anthropic").unwrap();
    assert!(claude.supports_completion());
    assert!(!registry.get("yandex").unwrap().supports_completion());
}

#[test]
fn test_deepl_withoutKey_shouldBeKeylessFallback() {
    let registry = ProviderRegistry::from_config(&Config::default());
    let deepl = registry.get("deepl").unwrap();

    assert!(!deepl.is_configured());
    assert!(deepl.supports_keyless_fallback());
    assert!(ProviderRegistry::is_usable(deepl.as_ref()));
    assert_eq!(deepl.display_name(), "DeepL (Free)");
}
