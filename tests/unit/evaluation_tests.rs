/*!
 * Tests for the evaluation coordinator
 */

use std::sync::Arc;

use multitrans::errors::{EvaluationError, ProviderError, ProviderErrorKind};
use multitrans::providers::mock::MockProvider;
use multitrans::translation::evaluation::{EvaluationCoordinator, has_structural_tokens, parse_response};

fn candidates() -> Vec<(String, String)> {
    vec![
        ("upper".to_string(), "HELLO WORLD.".to_string()),
        ("rev".to_string(), ".dlrow olleH".to_string()),
    ]
}

const ANSWER: &str = "Here is my verdict:\n```json\n{\"evaluations\":[\
    {\"provider\":\"[[provider:rev]]\",\"score\":-2,\"rationale\":\"Reversed.\"},\
    {\"provider\":\"upper\",\"score\":7.5,\"rationale\":\"Shouting but correct.\"}],\
    \"best_provider\":\"upper\",\"improved_translation\":\"Hello world.\"}\n```";

#[tokio::test]
async fn test_evaluate_shouldSendExactlyOnePromptAndParseAnswer() {
    let judge = MockProvider::working().with_name("judge").with_completion(ANSWER);
    let coordinator = EvaluationCoordinator::new(Arc::new(judge.clone()));

    let result = coordinator
        .evaluate("Hello world.", &candidates(), "en", "de")
        .await
        .unwrap();

    assert_eq!(judge.prompts().len(), 1);
    assert_eq!(judge.request_count(), 0);
    assert_eq!(result.evaluator, "judge");
    assert_eq!(result.best_provider, "upper");
    assert_eq!(result.improved_translation, "Hello world.");
    // candidate order is kept and scores are clamped
    assert_eq!(result.evaluations[0].provider, "upper");
    assert_eq!(result.score("upper"), Some(7.5));
    assert_eq!(result.score("rev"), Some(0.0));
    assert_eq!(result.rationale("rev"), Some("Reversed."));

    let prompt = &judge.prompts()[0];
    assert!(prompt.contains("[[provider:upper]]\nHELLO WORLD."));
    assert!(prompt.contains("[[provider:rev]]\n.dlrow olleH"));
}

#[tokio::test]
async fn test_evaluate_withProviderFailure_shouldReportProviderFailure() {
    let judge = MockProvider::failing(ProviderErrorKind::Network).with_completion("{}");
    let coordinator = EvaluationCoordinator::new(Arc::new(judge));

    let error = coordinator
        .evaluate("Hello", &candidates(), "en", "de")
        .await
        .unwrap_err();
    assert!(matches!(error, EvaluationError::ProviderFailure(ProviderError::Network(_))));
}

#[tokio::test]
async fn test_evaluate_withoutCompletionSupport_shouldBeNotConfigured() {
    let coordinator = EvaluationCoordinator::new(Arc::new(MockProvider::working().with_name("plain")));

    let error = coordinator
        .evaluate("Hello", &candidates(), "en", "de")
        .await
        .unwrap_err();
    assert_eq!(error, EvaluationError::NotConfigured("plain".to_string()));
}

#[tokio::test]
async fn test_evaluate_withoutCandidates_shouldFailBeforeCallingEvaluator() {
    let judge = MockProvider::working().with_completion(ANSWER);
    let coordinator = EvaluationCoordinator::new(Arc::new(judge.clone()));

    let error = coordinator.evaluate("Hello", &[], "en", "de").await.unwrap_err();
    assert_eq!(error, EvaluationError::NoCandidates);
    assert!(judge.prompts().is_empty());
}

#[test]
fn test_parseResponse_withPartialTable_shouldFailWhole() {
    let partial = r#"{"evaluations":[{"provider":"upper","score":5,"rationale":"ok"}],
        "best_provider":"upper","improved_translation":"Hello"}"#;
    let error = parse_response(partial, &candidates(), "judge").unwrap_err();
    assert!(matches!(error, EvaluationError::ParseFailure(message) if message.contains("rev")));
}

#[test]
fn test_parseResponse_withInvalidAnswers_shouldFail() {
    let cases = [
        "not json at all",
        r#"{"evaluations":[],"best_provider":"upper"}"#,
        r#"{"evaluations":[{"provider":"upper","score":"high"},{"provider":"rev","score":1}],
            "best_provider":"upper","improved_translation":"x"}"#,
        r#"{"evaluations":[{"provider":"upper","score":1},{"provider":"rev","score":1}],
            "best_provider":"google","improved_translation":"x"}"#,
        r#"{"evaluations":[{"provider":"upper","score":1},{"provider":"rev","score":1}],
            "best_provider":"rev","improved_translation":"   "}"#,
        r#"{"evaluations":[{"provider":"upper","score":1},{"provider":"upper","score":2},
            {"provider":"rev","score":1}],"best_provider":"rev","improved_translation":"x"}"#,
    ];
    for raw in cases {
        assert!(
            matches!(parse_response(raw, &candidates(), "judge"), Err(EvaluationError::ParseFailure(_))),
            "accepted invalid answer: {}",
            raw
        );
    }
}

#[test]
fn test_hasStructuralTokens_shouldDetectDialogueAndMarkers() {
    assert!(has_structural_tokens("e \"Hello there.\""));
    assert!(has_structural_tokens("Intro <<ENTRY_1>> text"));
    assert!(!has_structural_tokens("Plain prose. Nothing special here."));
}
