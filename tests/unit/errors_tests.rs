/*!
 * Tests for the error types
 */

use multitrans::errors::{
    AppError, EvaluationError, GlossaryError, OrchestrationError, ProviderError, ProviderErrorKind,
    RegistryError,
};

#[test]
fn test_providerError_display_shouldIncludeDetail() {
    let error = ProviderError::RateLimit("quota exhausted".to_string());
    assert_eq!(error.to_string(), "Rate limit exceeded: quota exhausted");
    assert_eq!(error.kind().to_string(), "rate_limit");
}

#[test]
fn test_providerError_unsupportedLanguage_shouldBeUnsupportedKind() {
    let error = ProviderError::UnsupportedLanguage("tlh".to_string());
    assert_eq!(error.kind(), ProviderErrorKind::Unsupported);
}

#[test]
fn test_providerError_serde_shouldUseKindAndMessage() {
    let error = ProviderError::Timeout("30s".to_string());
    let json = serde_json::to_string(&error).unwrap();
    assert_eq!(json, r#"{"kind":"timeout","message":"30s"}"#);

    let restored: ProviderError = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, error);
}

#[test]
fn test_appError_fromLayerErrors_shouldWrap() {
    let app: AppError = OrchestrationError::NoProviders.into();
    assert!(matches!(app, AppError::Orchestration(OrchestrationError::NoProviders)));

    let app: AppError = GlossaryError::EmptyTerm.into();
    assert!(app.to_string().starts_with("Glossary error"));

    let app: AppError = EvaluationError::NoCandidates.into();
    assert!(matches!(app, AppError::Evaluation(_)));

    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.txt");
    let app: AppError = io.into();
    assert!(matches!(app, AppError::File(message) if message.contains("missing.txt")));
}

#[test]
fn test_registryError_display_shouldNameProvider() {
    assert_eq!(
        RegistryError::NotConfigured("google".to_string()).to_string(),
        "Provider 'google' is not configured"
    );
    assert!(RegistryError::UnknownProvider("babelfish".to_string())
        .to_string()
        .contains("babelfish"));
}

#[test]
fn test_orchestrationError_invalidWorkers_shouldDisplayCount() {
    assert_eq!(
        OrchestrationError::InvalidWorkerCount(0).to_string(),
        "Invalid worker count 0: must be at least 1"
    );
}
