/*!
 * Repository for the translation history.
 *
 * Records are written once and read back newest first. Result lists and
 * evaluations are stored as JSON columns.
 */

use anyhow::{Context, Result};
use log::debug;
use rusqlite::{Connection, OptionalExtension, params};
use sha2::{Digest, Sha256};

use super::connection::DatabaseConnection;
use super::models::HistoryRecord;

const SELECT_COLUMNS: &str = "SELECT id, created_at, source_language, target_language, original_text, results, evaluation FROM history";

/// Columns as read from SQLite, before JSON decoding
struct RawRecord {
    id: String,
    created_at: String,
    source_language: String,
    target_language: String,
    original_text: String,
    results: String,
    evaluation: Option<String>,
}

impl RawRecord {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            created_at: row.get(1)?,
            source_language: row.get(2)?,
            target_language: row.get(3)?,
            original_text: row.get(4)?,
            results: row.get(5)?,
            evaluation: row.get(6)?,
        })
    }

    fn decode(self) -> Result<HistoryRecord> {
        let results = serde_json::from_str(&self.results)
            .with_context(|| format!("Corrupt results in history record {}", self.id))?;
        let evaluation = self
            .evaluation
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .with_context(|| format!("Corrupt evaluation in history record {}", self.id))?;

        Ok(HistoryRecord {
            id: self.id,
            created_at: self.created_at,
            source_language: self.source_language,
            target_language: self.target_language,
            original_text: self.original_text,
            results,
            evaluation,
        })
    }
}

/// Append-only access to the history table
#[derive(Clone)]
pub struct HistoryRepository {
    db: DatabaseConnection,
}

impl HistoryRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Repository on the default database location
    pub fn new_default() -> Result<Self> {
        Ok(Self::new(DatabaseConnection::new_default()?))
    }

    /// Repository on an in-memory database
    pub fn new_in_memory() -> Result<Self> {
        Ok(Self::new(DatabaseConnection::new_in_memory()?))
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Compute SHA256 hash of text
    pub fn hash_text(text: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Store a record
    pub async fn append(&self, record: &HistoryRecord) -> Result<()> {
        let results = serde_json::to_string(&record.results).context("Failed to serialize results")?;
        let evaluation = record
            .evaluation
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .context("Failed to serialize evaluation")?;
        let text_hash = Self::hash_text(&record.original_text);
        let record = record.clone();

        self.db
            .execute_async(move |conn| {
                conn.execute(
                    r#"
                    INSERT INTO history (
                        id, created_at, source_language, target_language,
                        original_text, text_hash, results, evaluation
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                    "#,
                    params![
                        record.id,
                        record.created_at,
                        record.source_language,
                        record.target_language,
                        record.original_text,
                        text_hash,
                        results,
                        evaluation,
                    ],
                )
                .with_context(|| format!("Failed to store history record {}", record.id))?;
                debug!("Stored history record {}", record.id);
                Ok(())
            })
            .await
    }

    /// Most recent records first
    pub async fn list(&self, limit: usize) -> Result<Vec<HistoryRecord>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.db
            .execute_async(move |conn| {
                Self::query_records(
                    conn,
                    &format!("{} ORDER BY created_at DESC, rowid DESC LIMIT ?1", SELECT_COLUMNS),
                    params![limit],
                )
            })
            .await
    }

    /// Look up one record
    pub async fn get(&self, id: &str) -> Result<Option<HistoryRecord>> {
        let id = id.to_string();
        self.db
            .execute_async(move |conn| {
                let raw = conn
                    .query_row(
                        &format!("{} WHERE id = ?1", SELECT_COLUMNS),
                        [&id],
                        RawRecord::from_row,
                    )
                    .optional()?;
                raw.map(RawRecord::decode).transpose()
            })
            .await
    }

    /// Records whose original text is exactly `text`, most recent first
    pub async fn find_by_text(&self, text: &str) -> Result<Vec<HistoryRecord>> {
        let text_hash = Self::hash_text(text);
        let text = text.to_string();
        self.db
            .execute_async(move |conn| {
                Self::query_records(
                    conn,
                    &format!(
                        "{} WHERE text_hash = ?1 AND original_text = ?2 ORDER BY created_at DESC, rowid DESC",
                        SELECT_COLUMNS
                    ),
                    params![text_hash, text],
                )
            })
            .await
    }

    /// Remove one record, returning whether it existed
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let id = id.to_string();
        self.db
            .execute_async(move |conn| {
                let deleted = conn.execute("DELETE FROM history WHERE id = ?1", [&id])?;
                Ok(deleted > 0)
            })
            .await
    }

    /// Remove every record, returning how many were removed
    pub async fn clear(&self) -> Result<usize> {
        self.db
            .execute_async(|conn| {
                let deleted = conn.execute("DELETE FROM history", [])?;
                debug!("Cleared {} history records", deleted);
                Ok(deleted)
            })
            .await
    }

    pub async fn count(&self) -> Result<i64> {
        self.db
            .execute_async(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM history", [], |row| row.get(0))?))
            .await
    }

    fn query_records(conn: &Connection, sql: &str, params: impl rusqlite::Params) -> Result<Vec<HistoryRecord>> {
        let mut stmt = conn.prepare(sql)?;
        let raws = stmt
            .query_map(params, RawRecord::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        raws.into_iter().map(RawRecord::decode).collect()
    }
}
