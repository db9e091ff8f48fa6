/*!
 * History records as stored in the database.
 */

use serde::{Deserialize, Serialize};

use crate::translation::evaluation::EvaluationResult;
use crate::translation::orchestrator::ProviderResult;

/// One finished translation, never modified after it is written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// Unique record identifier (UUID)
    pub id: String,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
    pub source_language: String,
    pub target_language: String,
    pub original_text: String,
    /// Per-provider results in provider order
    pub results: Vec<ProviderResult>,
    pub evaluation: Option<EvaluationResult>,
}

impl HistoryRecord {
    /// Create a record with a fresh id and the current time
    pub fn new(
        source_language: impl Into<String>,
        target_language: impl Into<String>,
        original_text: impl Into<String>,
        results: Vec<ProviderResult>,
        evaluation: Option<EvaluationResult>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            source_language: source_language.into(),
            target_language: target_language.into(),
            original_text: original_text.into(),
            results,
            evaluation,
        }
    }

    /// Names of the providers in this record
    pub fn provider_names(&self) -> Vec<&str> {
        self.results.iter().map(|r| r.provider.as_str()).collect()
    }

    /// First line of the original text, cut to `max_chars` characters
    pub fn preview(&self, max_chars: usize) -> String {
        let first_line = self.original_text.lines().next().unwrap_or_default();
        let mut preview: String = first_line.chars().take(max_chars).collect();
        if first_line.chars().count() > max_chars || self.original_text.lines().nth(1).is_some() {
            preview.push_str("...");
        }
        preview
    }
}
