//! SQLite-backed comparison store.
//!
//! Records are append-only: create, list, fetch and delete, no update. Ids come
//! from `AUTOINCREMENT`, so a deleted id is never handed out again. Timestamps
//! are stored as fixed-width RFC 3339 UTC strings so lexical order matches
//! chronological order.

use crate::error::{CompareError, Result};
use crate::models::ComparisonRecord;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

const SELECT_COLUMNS: &str =
    "SELECT id, term, grokipedia_html, wikipedia_text, gemini_comparison, timestamp FROM comparisons";

#[derive(Debug, Clone)]
pub struct ComparisonStore {
    db_path: PathBuf,
}

impl ComparisonStore {
    /// Open (creating if needed) the store at `db_path`.
    ///
    /// The schema is created on first use; an existing database keeps its
    /// records.
    ///
    /// # Arguments
    ///
    /// * `db_path` - SQLite file; its directory must already exist
    ///
    /// # Errors
    ///
    /// [`CompareError::Storage`] if the file cannot be opened or the schema
    /// cannot be created.
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let store = Self {
            db_path: db_path.as_ref().to_path_buf(),
        };
        store.init_schema()?;
        Ok(store)
    }

    pub fn database_path(&self) -> &Path {
        &self.db_path
    }

    fn connect(&self) -> Result<Connection> {
        Ok(Connection::open(&self.db_path)?)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.connect()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS comparisons (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                term TEXT NOT NULL,
                grokipedia_html TEXT NOT NULL,
                wikipedia_text TEXT NOT NULL,
                gemini_comparison TEXT NOT NULL,
                timestamp TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_comparisons_timestamp ON comparisons(timestamp);
            "#,
        )?;
        debug!(path = %self.db_path.display(), "Comparison schema ready");
        Ok(())
    }

    /// Persist a new comparison and return its id.
    ///
    /// The term is stored trimmed. The id and the timestamp are assigned here.
    ///
    /// # Arguments
    ///
    /// * `term` - Topic as the user typed it
    /// * `grokipedia_html` - Normalized article markup
    /// * `wikipedia_text` - Plain-text extract
    /// * `analysis` - Markdown returned by the model
    ///
    /// # Returns
    ///
    /// The new record's id. Ids increase and are never reused.
    ///
    /// # Errors
    ///
    /// [`CompareError::Validation`] if any field is empty.
    #[instrument(level = "info", skip_all, fields(term = %term.trim()))]
    pub fn create(
        &self,
        term: &str,
        grokipedia_html: &str,
        wikipedia_text: &str,
        analysis: &str,
    ) -> Result<i64> {
        let term = term.trim();
        let missing: Vec<&str> = [
            ("term", term),
            ("grokipediaHtml", grokipedia_html),
            ("wikipediaText", wikipedia_text),
            ("geminiComparison", analysis),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();

        if !missing.is_empty() {
            return Err(CompareError::Validation(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        }

        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO comparisons (term, grokipedia_html, wikipedia_text, gemini_comparison, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![term, grokipedia_html, wikipedia_text, analysis, timestamp],
        )?;
        let id = conn.last_insert_rowid();
        info!(id, "Saved comparison");
        Ok(id)
    }

    /// Every record, most recent first.
    ///
    /// Ties on timestamp are broken by id, newest first. An empty database
    /// yields an empty list.
    pub fn list_all(&self) -> Result<Vec<ComparisonRecord>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} ORDER BY timestamp DESC, id DESC"))?;
        let records = stmt
            .query_map([], row_to_record)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        debug!(count = records.len(), "Listed comparisons");
        Ok(records)
    }

    /// A single record, or `None` when the id does not exist.
    pub fn get_by_id(&self, id: i64) -> Result<Option<ComparisonRecord>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} WHERE id = ?1"))?;
        let record = stmt.query_row(params![id], row_to_record).optional()?;
        Ok(record)
    }

    /// Remove a record. Returns whether anything was deleted.
    #[instrument(level = "info", skip(self))]
    pub fn delete_by_id(&self, id: i64) -> Result<bool> {
        let conn = self.connect()?;
        let changes = conn.execute("DELETE FROM comparisons WHERE id = ?1", params![id])?;
        let removed = changes > 0;
        info!(removed, "Delete requested");
        Ok(removed)
    }
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<ComparisonRecord> {
    let timestamp: String = row.get(5)?;
    let timestamp = DateTime::parse_from_rfc3339(&timestamp)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?;

    Ok(ComparisonRecord {
        id: row.get(0)?,
        term: row.get(1)?,
        grokipedia_html: row.get(2)?,
        wikipedia_text: row.get(3)?,
        analysis: row.get(4)?,
        timestamp,
    })
}
