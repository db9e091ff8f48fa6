/*!
 * Multi-provider translation.
 *
 * The module is split into several submodules:
 *
 * - `segmenter`: Sentence-aware chunking of the input text
 * - `registry`: Provider instances and the active-provider selection
 * - `orchestrator`: Parallel execution of (chunk, provider) tasks and reassembly
 * - `glossary`: Terminology substitution on translated output
 * - `evaluation`: LLM-based ranking of the provider translations
 * - `service`: One call tying the pieces together
 */

pub use self::evaluation::{EvaluationCoordinator, EvaluationResult, ProviderEvaluation};
pub use self::glossary::{Glossary, GlossaryApplier, GlossaryEntry, GlossaryStore};
pub use self::orchestrator::{
    CancellationHandle, OrchestrationOptions, OrchestrationReport, ProviderResult, ProviderStatus,
    TaskOutcome, TranslationOrchestrator,
};
pub use self::registry::{ProviderRegistry, ProviderSelection, SkippedProvider};
pub use self::segmenter::{Chunk, TextSegmenter, segment};
pub use self::service::{TranslationOutcome, TranslationRequest, TranslationService};

pub mod evaluation;
pub mod glossary;
pub mod orchestrator;
pub mod registry;
pub mod segmenter;
pub mod service;
