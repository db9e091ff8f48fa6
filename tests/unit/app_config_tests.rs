/*!
 * Tests for configuration loading and validation
 */

use multitrans::app_config::{Config, DeeplPlan, LogLevel, ProviderKind};

use crate::common::{create_temp_dir, create_test_file, test_config};

#[test]
fn test_default_shouldValidate() {
    let config = Config::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.source_language, "auto");
    assert_eq!(config.selected_providers, vec!["deepl"]);
    assert_eq!(config.providers.len(), ProviderKind::REMOTE.len());
}

#[test]
fn test_validate_withOutOfRangeValues_shouldFail() {
    let invalid: [fn(&mut Config); 7] = [
        |c| c.target_language = "auto".to_string(),
        |c| c.source_language = "nope".to_string(),
        |c| c.max_chunk_size = 0,
        |c| c.max_workers = 0,
        |c| c.max_workers = 1000,
        |c| c.timeout_secs = Some(0),
        |c| c.provider_config_mut(ProviderKind::OpenAI).endpoint = "not a url".to_string(),
    ];

    for mutate in invalid {
        let mut config = Config::default();
        mutate(&mut config);
        assert!(config.validate().is_err(), "accepted {:?}", config);
    }
}

#[test]
fn test_loadOrCreate_withMissingFile_shouldWriteDefaults() {
    let dir = create_temp_dir().unwrap();
    let path = dir.path().join("multitrans.json");

    let config = Config::load_or_create(&path).unwrap();
    assert!(path.exists());
    assert_eq!(config.target_language, Config::default().target_language);

    let reloaded = Config::load(&path).unwrap();
    assert_eq!(reloaded.max_workers, config.max_workers);
}

#[test]
fn test_load_withPartialJson_shouldFillDefaults() {
    let dir = create_temp_dir().unwrap();
    let path = create_test_file(
        dir.path(),
        "partial.json",
        r#"{
            "target_language": "fr",
            "max_workers": 8,
            "log_level": "debug",
            "providers": [{"type": "deepl", "api_key": "k", "plan": "pro"}]
        }"#,
    )
    .unwrap();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.target_language, "fr");
    assert_eq!(config.max_workers, 8);
    assert_eq!(config.max_chunk_size, Config::default().max_chunk_size);
    assert_eq!(config.log_level, LogLevel::Debug);

    let deepl = config.provider_config(ProviderKind::DeepL).unwrap();
    assert_eq!(deepl.api_key, "k");
    assert_eq!(deepl.plan, DeeplPlan::Pro);
    assert!(config.provider_config(ProviderKind::Google).is_none());
}

#[test]
fn test_load_withInvalidJson_shouldFail() {
    let dir = create_temp_dir().unwrap();
    let path = create_test_file(dir.path(), "broken.json", "{ not json").unwrap();

    let error = Config::load(&path).unwrap_err();
    assert!(error.to_string().contains("Failed to parse config file"));
}

#[test]
fn test_saveAndLoad_shouldKeepProviderSettings() {
    let dir = create_temp_dir().unwrap();
    let path = dir.path().join("saved.json");
    let mut config = test_config(dir.path());
    config.evaluator_provider = Some("claude".to_string());
    config.provider_config_mut(ProviderKind::Claude).api_key = "secret".to_string();

    config.save(&path).unwrap();
    let loaded = Config::load(&path).unwrap();

    assert_eq!(loaded.evaluator_provider.as_deref(), Some("claude"));
    assert_eq!(loaded.provider_config(ProviderKind::Claude).unwrap().api_key, "secret");
    assert_eq!(loaded.history_database_path().unwrap(), dir.path().join("history.db"));
}

#[test]
fn test_providerKind_fromStr_shouldAcceptAliases() {
    assert_eq!("Anthropic".parse::<ProviderKind>().unwrap(), ProviderKind::Claude);
    assert_eq!(" DeepL ".parse::<ProviderKind>().unwrap(), ProviderKind::DeepL);
    assert!("babelfish".parse::<ProviderKind>().is_err());
}
