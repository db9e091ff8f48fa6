/*!
 * Fan-out/fan-in tests for the translation orchestrator
 */

use std::sync::{Arc, Mutex};
use std::time::Duration;

use multitrans::errors::{OrchestrationError, ProviderErrorKind, SegmentationError};
use multitrans::providers::TranslationProvider;
use multitrans::translation::orchestrator::{
    CancellationHandle, OrchestrationOptions, ProviderStatus, TaskOutcome, TranslationOrchestrator,
};

use crate::common::init_logging;
use crate::common::stub_providers::{
    BrokenProvider, LatencyProvider, SelectiveFailureProvider, SleepyProvider, rev, upper,
};

/// One sentence per chunk at a chunk size of 40
fn numbered_sentences(count: usize) -> String {
    (0..count)
        .map(|i| format!("Sentence number {} is here. ", i))
        .collect::<String>()
        .trim_end()
        .to_string()
}

#[tokio::test]
async fn test_translateParallel_withTwoProviders_shouldReturnBothTranslations() {
    init_logging();
    let orchestrator = TranslationOrchestrator::new();
    let options = OrchestrationOptions::new(2, 100);

    let report = orchestrator
        .translate_parallel("Hello world. How are you?", "en", "de", &[upper(), rev()], &options)
        .await
        .unwrap();

    assert_eq!(report.chunk_count(), 1);
    assert_eq!(report.total_tasks, 2);
    assert_eq!(report.get("upper").unwrap().text, "HELLO WORLD. HOW ARE YOU?");
    assert_eq!(report.get("rev").unwrap().text, "?uoy era woH .dlrow olleH");
    assert!(report.results.iter().all(|r| r.status == ProviderStatus::Complete));
    assert!(!report.cancelled);
    assert!(!report.timed_out);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_translateParallel_acrossWorkerCounts_shouldReassembleInOrder() {
    let text = numbered_sentences(20);
    let orchestrator = TranslationOrchestrator::new();
    let mut texts = Vec::new();

    for workers in [1, 2, 4, 8] {
        let latency = Arc::new(LatencyProvider::new("latency"));
        let providers = vec![latency.clone() as Arc<dyn TranslationProvider>, upper()];
        let options = OrchestrationOptions::new(workers, 40);

        let report = orchestrator
            .translate_parallel(&text, "en", "fr", &providers, &options)
            .await
            .unwrap();

        let joined: String = report.chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(joined, text);
        assert_eq!(report.chunk_count(), 20);

        let expected: String = report
            .chunks
            .iter()
            .map(|c| format!("<{}>{}", c.text.trim_end(), c.trailing_whitespace()))
            .collect();
        let result = report.get("latency").unwrap();
        assert_eq!(result.text, expected);
        assert_eq!(report.get("upper").unwrap().text, text.to_uppercase());

        assert_eq!(latency.calls(), report.chunk_count());
        assert!(latency.max_in_flight() <= workers);
        if workers > 1 {
            assert!(latency.max_in_flight() > 1, "no overlap with {} workers", workers);
        }
        texts.push(result.text.clone());
    }

    assert!(texts.windows(2).all(|pair| pair[0] == pair[1]));
}

#[tokio::test]
async fn test_translateParallel_withFailingProviders_shouldIsolateFailures() {
    let text = numbered_sentences(6);
    let providers: Vec<Arc<dyn TranslationProvider>> = vec![
        upper(),
        Arc::new(BrokenProvider),
        Arc::new(SelectiveFailureProvider {
            needle: "number 3 ".to_string(),
        }),
    ];

    let report = TranslationOrchestrator::new()
        .translate_parallel(&text, "en", "de", &providers, &OrchestrationOptions::new(3, 40))
        .await
        .unwrap();

    assert_eq!(report.get("upper").unwrap().status, ProviderStatus::Complete);

    let broken = report.get("broken").unwrap();
    assert_eq!(broken.status, ProviderStatus::Failed);
    assert_eq!(broken.errors.len(), report.chunk_count());
    assert_eq!(
        broken.text.matches("[Error: Authentication error: invalid key]").count(),
        report.chunk_count()
    );

    let selective = report.get("selective").unwrap();
    assert_eq!(selective.status, ProviderStatus::Partial);
    assert_eq!(selective.errors.len(), 1);
    assert_eq!(selective.errors[0].chunk_index, 3);
    assert_eq!(selective.errors[0].error.kind(), ProviderErrorKind::Malformed);
    assert!(selective.text.contains("Sentence number 2 is here. [Error: Malformed response"));
    assert!(selective.text.ends_with("Sentence number 5 is here."));

    let usable: Vec<String> = report.usable_translations().into_iter().map(|(name, _)| name).collect();
    assert_eq!(usable, vec!["upper", "selective"]);
}

#[tokio::test]
async fn test_translateParallel_withDeadline_shouldTimeOutSlowProvider() {
    let providers: Vec<Arc<dyn TranslationProvider>> = vec![
        upper(),
        Arc::new(SleepyProvider {
            delay: Duration::from_secs(5),
        }),
    ];
    let options = OrchestrationOptions::new(4, 100).with_timeout(Duration::from_millis(200));

    let report = TranslationOrchestrator::new()
        .translate_parallel("Short text. Another one.", "en", "de", &providers, &options)
        .await
        .unwrap();

    assert!(report.timed_out);
    assert!(report.get("upper").unwrap().is_complete());

    let sleepy = report.get("sleepy").unwrap();
    assert_eq!(sleepy.status, ProviderStatus::Failed);
    assert!(sleepy
        .errors
        .iter()
        .all(|e| e.error.kind() == ProviderErrorKind::Timeout));
    assert!(report.elapsed < Duration::from_secs(5));
}

#[tokio::test]
async fn test_translateParallel_cancelledBeforeStart_shouldCancelEveryTask() {
    let cancellation = CancellationHandle::new();
    cancellation.cancel();
    let options = OrchestrationOptions::new(2, 40).with_cancellation(cancellation);

    let report = TranslationOrchestrator::new()
        .translate_parallel(&numbered_sentences(4), "en", "de", &[upper()], &options)
        .await
        .unwrap();

    assert!(report.cancelled);
    let result = report.get("upper").unwrap();
    assert_eq!(result.status, ProviderStatus::Failed);
    assert_eq!(result.cancelled_chunks(), vec![0, 1, 2, 3]);
    assert!(result.errors.is_empty());
    assert_eq!(result.text.matches("[Cancelled]").count(), 4);
}

#[tokio::test]
async fn test_translateParallel_cancelledMidway_shouldKeepFinishedChunks() {
    let cancellation = CancellationHandle::new();
    let trigger = cancellation.clone();
    let options = OrchestrationOptions::new(1, 40)
        .with_cancellation(cancellation)
        .with_progress(move |_, _| trigger.cancel());
    let sleepy: Arc<dyn TranslationProvider> = Arc::new(SleepyProvider {
        delay: Duration::from_millis(20),
    });

    let report = TranslationOrchestrator::new()
        .translate_parallel(&numbered_sentences(6), "en", "de", &[sleepy], &options)
        .await
        .unwrap();

    let result = report.get("sleepy").unwrap();
    assert!(report.cancelled);
    assert_eq!(result.status, ProviderStatus::Partial);
    assert!(result.outcomes[0].is_success());
    assert_eq!(result.outcomes[5], TaskOutcome::Cancelled);
    assert!(result
        .outcomes
        .iter()
        .all(|o| matches!(o, TaskOutcome::Success(_) | TaskOutcome::Cancelled)));
    assert!(result.text.starts_with("Sentence number 0 is here. "));
}

#[tokio::test]
async fn test_translateParallel_shouldReportMonotonicProgress() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let options = OrchestrationOptions::new(3, 40).with_progress(move |done, total| {
        sink.lock().unwrap().push((done, total));
    });

    let report = TranslationOrchestrator::new()
        .translate_parallel(&numbered_sentences(5), "en", "de", &[upper(), rev()], &options)
        .await
        .unwrap();

    let seen = seen.lock().unwrap().clone();
    assert_eq!(seen.len(), report.total_tasks);
    assert_eq!(report.total_tasks, 10);
    assert!(seen.windows(2).all(|pair| pair[0].0 < pair[1].0));
    assert!(seen.iter().all(|&(_, total)| total == 10));
    assert_eq!(seen.last(), Some(&(10, 10)));
}

#[tokio::test]
async fn test_translateParallel_withEmptyText_shouldProduceEmptyResults() {
    let calls = Arc::new(Mutex::new(0));
    let counter = Arc::clone(&calls);
    let options = OrchestrationOptions::new(2, 40).with_progress(move |_, _| *counter.lock().unwrap() += 1);

    let report = TranslationOrchestrator::new()
        .translate_parallel("", "en", "de", &[upper()], &options)
        .await
        .unwrap();

    assert_eq!(report.chunk_count(), 0);
    assert_eq!(report.get("upper").unwrap().text, "");
    assert_eq!(*calls.lock().unwrap(), 0);
}

#[tokio::test]
async fn test_translateParallel_withInvalidSetup_shouldFailBeforeDispatch() {
    let orchestrator = TranslationOrchestrator::new();

    let no_providers = orchestrator
        .translate_parallel("Hi.", "en", "de", &[], &OrchestrationOptions::new(2, 40))
        .await;
    assert_eq!(no_providers.unwrap_err(), OrchestrationError::NoProviders);

    let no_workers = orchestrator
        .translate_parallel("Hi.", "en", "de", &[upper()], &OrchestrationOptions::new(0, 40))
        .await;
    assert_eq!(no_workers.unwrap_err(), OrchestrationError::InvalidWorkerCount(0));

    let no_chunk = orchestrator
        .translate_parallel("Hi.", "en", "de", &[upper()], &OrchestrationOptions::new(2, 0))
        .await;
    assert_eq!(
        no_chunk.unwrap_err(),
        OrchestrationError::Segmentation(SegmentationError::InvalidChunkSize(0))
    );
}

#[test]
fn test_translateParallelBlocking_shouldMatchAsyncResult() {
    let report = TranslationOrchestrator::new()
        .translate_parallel_blocking(
            &numbered_sentences(3),
            "en",
            "de",
            &[upper(), rev()],
            &OrchestrationOptions::new(2, 40),
        )
        .unwrap();

    assert_eq!(report.get("upper").unwrap().text, numbered_sentences(3).to_uppercase());
    assert!(report.get("rev").unwrap().is_complete());
}
