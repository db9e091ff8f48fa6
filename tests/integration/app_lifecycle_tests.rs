/*!
 * Controller lifecycle with a glossary file and a history database
 */

use std::sync::Arc;

use multitrans::app_config::Config;
use multitrans::app_controller::Controller;
use multitrans::database::HistoryRepository;
use multitrans::providers::mock::MockProvider;
use multitrans::translation::orchestrator::CancellationHandle;
use multitrans::translation::registry::ProviderRegistry;

use crate::common::stub_providers::{rev, upper};
use crate::common::{create_temp_dir, create_test_file, init_logging, test_config};

fn registry() -> Arc<ProviderRegistry> {
    Arc::new(
        ProviderRegistry::new()
            .with_provider(upper())
            .with_provider(rev())
            .with_provider(Arc::new(MockProvider::working().with_name("judge").with_completion(
                r#"{"evaluations":[{"provider":"upper","score":9,"rationale":"Good."},
                    {"provider":"rev","score":2,"rationale":"Backwards."}],
                    "best_provider":"upper","improved_translation":"Hello Welt."}"#,
            ))),
    )
}

fn config(dir: &std::path::Path) -> Config {
    Config {
        selected_providers: vec!["upper".to_string(), "rev".to_string(), "missing".to_string()],
        evaluator_provider: Some("judge".to_string()),
        ..test_config(dir)
    }
}

#[tokio::test]
async fn test_controller_fullLifecycle_shouldPersistGlossaryAndHistory() {
    init_logging();
    let dir = create_temp_dir().unwrap();
    let controller = Controller::with_config(config(dir.path()))
        .unwrap()
        .with_registry(registry())
        .with_history(HistoryRepository::new_in_memory().unwrap())
        .with_progress_bar(false);

    assert!(controller.glossary_add("world", "Erde", false).unwrap().is_none());
    let replaced = controller.glossary_add("world", "Welt", false).unwrap().unwrap();
    assert_eq!(replaced.target, "Erde");
    assert!(dir.path().join("glossary.json").exists());

    let outcome = controller
        .translate("Hello world.", true, true, CancellationHandle::new())
        .await
        .unwrap();
    assert_eq!(outcome.report.get("upper").unwrap().text, "HELLO Welt.");
    assert_eq!(outcome.skipped.len(), 1);

    let rendered = Controller::render_outcome(&outcome);
    assert!(rendered.contains("=== upper (complete) ===\nHELLO Welt."));
    assert!(rendered.contains("Skipped missing"));
    assert!(rendered.contains("* upper: 9.0/10 Good."));
    assert!(rendered.contains("=== Improved translation ===\nHello Welt."));

    let records = controller.history_list(10).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].provider_names(), vec!["upper", "rev"]);
    assert!(Controller::render_history_list(&records).contains("[upper, rev]  Hello world."));

    let record = controller.history_show(&records[0].id).await.unwrap();
    assert_eq!(record.results, outcome.report.results);
    assert_eq!(record.evaluation.as_ref().unwrap().best_provider, "upper");
    assert!(Controller::render_history_record(&record).contains("=== Original ===\nHello world."));

    let removed = controller.glossary_remove("world").unwrap();
    assert_eq!(removed.target, "Welt");
    assert!(controller.glossary_remove("world").is_err());
    assert!(controller.glossary_entries().unwrap().is_empty());

    assert_eq!(controller.history_clear().await.unwrap(), 1);
    assert!(controller.history_show(&record.id).await.is_err());
}

#[tokio::test]
async fn test_controller_withoutHistory_shouldNotRecordTranslation() {
    let dir = create_temp_dir().unwrap();
    let controller = Controller::with_config(config(dir.path()))
        .unwrap()
        .with_registry(registry())
        .with_history(HistoryRepository::new_in_memory().unwrap())
        .with_progress_bar(false);

    let outcome = controller
        .translate("Hello.", false, false, CancellationHandle::new())
        .await
        .unwrap();

    assert!(outcome.evaluation.is_none());
    assert!(controller.history_list(10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_controller_historyFile_shouldSurviveNewController() {
    let dir = create_temp_dir().unwrap();
    let first = Controller::with_config(config(dir.path()))
        .unwrap()
        .with_registry(registry())
        .with_progress_bar(false);
    first
        .translate("Good morning.", false, true, CancellationHandle::new())
        .await
        .unwrap();
    assert!(dir.path().join("history.db").exists());

    let second = Controller::with_config(config(dir.path())).unwrap();
    let records = second.history_list(5).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].original_text, "Good morning.");
    assert_eq!(records[0].target_language, "de");
}

#[test]
fn test_readInput_fromFile_shouldReturnContent() {
    let dir = create_temp_dir().unwrap();
    let path = create_test_file(dir.path(), "input.txt", "First line.\nSecond line.\n").unwrap();

    assert_eq!(
        Controller::read_input(Some(path.as_path())).unwrap(),
        "First line.\nSecond line.\n"
    );
    assert!(Controller::read_input(Some(dir.path().join("absent.txt").as_path())).is_err());
}
