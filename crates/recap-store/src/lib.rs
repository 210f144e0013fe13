//! Recap Storage Layer
//!
//! Implements the `ExtractionStore` trait on SQLite.
//!
//! # Architecture
//!
//! - One table per record kind: transcripts, extraction jobs, extracted items, item edits
//! - A job owns its items and an item owns its edits (`ON DELETE CASCADE`)
//! - Terminal job transitions and edits are written inside a single transaction
//! - Structured columns (field confidence, review reasons, snapshots) are JSON text
//!
//! # Examples
//!
//! ```no_run
//! use recap_store::SqliteStore;
//!
//! let store = SqliteStore::new(":memory:").unwrap();
//! // Store is now ready for job operations
//! ```

#![warn(missing_docs)]

use recap_domain::traits::ExtractionStore;
use recap_domain::{
    EditId, ExtractedItem, ExtractionJob, FieldConfidence, ItemCategory, ItemEdit, ItemId,
    ItemSnapshot, ItemStatus, JobId, JobOutcome, JobStatus, Transcript, TranscriptId,
};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use serde::de::DeserializeOwned;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Job is not in a state that allows the requested transition
    #[error("Invalid transition for job {job}: already {status}")]
    InvalidTransition {
        /// Job that refused the transition
        job: JobId,
        /// Its current status
        status: String,
    },

    /// Duplicate record detected
    #[error("Duplicate record: {0}")]
    Duplicate(String),

    /// JSON column could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

const JOB_COLUMNS: &str = "id, transcript_id, model, status, raw_output, parse_degraded, error,
     created_at, completed_at";

const ITEM_COLUMNS: &str = "id, job_id, category, title, details, speaker, timestamp_start,
     timestamp_end, confidence, field_confidence, needs_review, review_reasons, status, created_at";

const EDIT_COLUMNS: &str = "id, item_id, editor, prev_json, next_json, reason, created_at";

/// SQLite-based implementation of ExtractionStore
///
/// # Thread Safety
///
/// SQLite connections are not thread-safe. Share a store between tasks by
/// wrapping it in a mutex, or give each thread its own `SqliteStore`.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Create a new SqliteStore with the given database path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use recap_store::SqliteStore;
    ///
    /// let store = SqliteStore::new("recap.db").unwrap();
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let mut store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&mut self) -> Result<(), StoreError> {
        let schema = include_str!("schema.sql");
        self.conn.execute_batch(schema)?;
        Ok(())
    }

    /// Convert a u128-backed id to bytes for storage
    fn id_to_bytes(value: u128) -> Vec<u8> {
        value.to_be_bytes().to_vec()
    }

    /// Convert stored bytes back to a raw id value
    fn bytes_to_id(bytes: &[u8]) -> Result<u128, StoreError> {
        if bytes.len() != 16 {
            return Err(StoreError::InvalidData(format!(
                "Expected 16 bytes for id, got {}",
                bytes.len()
            )));
        }
        let mut arr = [0u8; 16];
        arr.copy_from_slice(bytes);
        Ok(u128::from_be_bytes(arr))
    }

    fn id_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<u128> {
        let bytes: Vec<u8> = row.get(idx)?;
        Self::bytes_to_id(&bytes)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Blob, Box::new(e)))
    }

    fn json_column<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
        let text: String = row.get(idx)?;
        serde_json::from_str(&text)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    }

    fn opt_json_column<T: DeserializeOwned>(
        row: &Row<'_>,
        idx: usize,
    ) -> rusqlite::Result<Option<T>> {
        let text: Option<String> = row.get(idx)?;
        text.map(|t| {
            serde_json::from_str(&t).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
            })
        })
        .transpose()
    }

    fn enum_column<T>(
        row: &Row<'_>,
        idx: usize,
        parse: fn(&str) -> Option<T>,
    ) -> rusqlite::Result<T> {
        let text: String = row.get(idx)?;
        parse(&text).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                idx,
                Type::Text,
                Box::new(StoreError::InvalidData(format!("Unknown value: {}", text))),
            )
        })
    }

    fn row_to_job(row: &Row<'_>) -> rusqlite::Result<ExtractionJob> {
        Ok(ExtractionJob {
            id: JobId::from_value(Self::id_column(row, 0)?),
            transcript_id: TranscriptId::from_value(Self::id_column(row, 1)?),
            model: row.get(2)?,
            status: Self::enum_column(row, 3, JobStatus::parse)?,
            raw_output: row.get(4)?,
            parse_degraded: row.get(5)?,
            error: row.get(6)?,
            created_at: row.get::<_, i64>(7)? as u64,
            completed_at: row.get::<_, Option<i64>>(8)?.map(|t| t as u64),
        })
    }

    fn row_to_item(row: &Row<'_>) -> rusqlite::Result<ExtractedItem> {
        Ok(ExtractedItem {
            id: ItemId::from_value(Self::id_column(row, 0)?),
            job_id: JobId::from_value(Self::id_column(row, 1)?),
            category: Self::enum_column(row, 2, ItemCategory::parse)?,
            title: row.get(3)?,
            details: row.get(4)?,
            speaker: row.get(5)?,
            timestamp_start: row.get(6)?,
            timestamp_end: row.get(7)?,
            confidence: row.get(8)?,
            field_confidence: Self::json_column::<FieldConfidence>(row, 9)?,
            needs_review: row.get(10)?,
            review_reasons: Self::opt_json_column(row, 11)?,
            status: Self::enum_column(row, 12, ItemStatus::parse)?,
            created_at: row.get::<_, i64>(13)? as u64,
        })
    }

    fn row_to_edit(row: &Row<'_>) -> rusqlite::Result<ItemEdit> {
        Ok(ItemEdit {
            id: EditId::from_value(Self::id_column(row, 0)?),
            item_id: ItemId::from_value(Self::id_column(row, 1)?),
            editor: row.get(2)?,
            prev: Self::json_column::<ItemSnapshot>(row, 3)?,
            next: Self::json_column::<ItemSnapshot>(row, 4)?,
            reason: row.get(5)?,
            created_at: row.get::<_, i64>(6)? as u64,
        })
    }

    fn insert_item(
        tx: &rusqlite::Transaction<'_>,
        position: usize,
        item: &ExtractedItem,
    ) -> Result<(), StoreError> {
        let field_confidence = serde_json::to_string(&item.field_confidence)?;
        let review_reasons = item
            .review_reasons
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        tx.execute(
            "INSERT INTO extracted_items (id, job_id, position, category, title, details, speaker,
                 timestamp_start, timestamp_end, confidence, field_confidence, needs_review,
                 review_reasons, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            params![
                Self::id_to_bytes(item.id.value()),
                Self::id_to_bytes(item.job_id.value()),
                position as i64,
                item.category.as_str(),
                &item.title,
                &item.details,
                &item.speaker,
                &item.timestamp_start,
                &item.timestamp_end,
                item.confidence,
                field_confidence,
                item.needs_review,
                review_reasons,
                item.status.as_str(),
                item.created_at as i64,
            ],
        )?;
        Ok(())
    }

    /// Count the items stored for a job
    pub fn count_items(&self, job: JobId) -> Result<usize, StoreError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM extracted_items WHERE job_id = ?1",
            params![Self::id_to_bytes(job.value())],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// List jobs created for a transcript, newest first
    pub fn list_jobs_for_transcript(
        &self,
        transcript: TranscriptId,
    ) -> Result<Vec<ExtractionJob>, StoreError> {
        let sql = format!(
            "SELECT {} FROM extraction_jobs WHERE transcript_id = ?1
             ORDER BY created_at DESC, rowid DESC",
            JOB_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let jobs = stmt
            .query_map(params![Self::id_to_bytes(transcript.value())], Self::row_to_job)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(jobs)
    }
}

impl ExtractionStore for SqliteStore {
    type Error = StoreError;

    fn create_transcript(&mut self, transcript: Transcript) -> Result<TranscriptId, Self::Error> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO transcripts (id, raw_text, created_at) VALUES (?1, ?2, ?3)",
            params![
                Self::id_to_bytes(transcript.id.value()),
                &transcript.raw_text,
                transcript.created_at as i64,
            ],
        )?;

        if inserted == 0 {
            return Err(StoreError::Duplicate(format!("transcript {}", transcript.id)));
        }

        Ok(transcript.id)
    }

    fn get_transcript(&self, id: TranscriptId) -> Result<Option<Transcript>, Self::Error> {
        let transcript = self
            .conn
            .query_row(
                "SELECT id, raw_text, created_at FROM transcripts WHERE id = ?1",
                params![Self::id_to_bytes(id.value())],
                |row| {
                    Ok(Transcript {
                        id: TranscriptId::from_value(Self::id_column(row, 0)?),
                        raw_text: row.get(1)?,
                        created_at: row.get::<_, i64>(2)? as u64,
                    })
                },
            )
            .optional()?;

        Ok(transcript)
    }

    fn create_job(&mut self, job: ExtractionJob) -> Result<JobId, Self::Error> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO extraction_jobs
                 (id, transcript_id, model, status, raw_output, parse_degraded, error,
                  created_at, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                Self::id_to_bytes(job.id.value()),
                Self::id_to_bytes(job.transcript_id.value()),
                &job.model,
                job.status.as_str(),
                &job.raw_output,
                job.parse_degraded,
                &job.error,
                job.created_at as i64,
                job.completed_at.map(|t| t as i64),
            ],
        )?;

        if inserted == 0 {
            return Err(StoreError::Duplicate(format!("job {}", job.id)));
        }

        Ok(job.id)
    }

    fn get_job(&self, id: JobId) -> Result<Option<ExtractionJob>, Self::Error> {
        let sql = format!("SELECT {} FROM extraction_jobs WHERE id = ?1", JOB_COLUMNS);
        let job = self
            .conn
            .query_row(&sql, params![Self::id_to_bytes(id.value())], Self::row_to_job)
            .optional()?;

        Ok(job)
    }

    fn complete_job(&mut self, id: JobId, outcome: JobOutcome) -> Result<(), Self::Error> {
        let id_bytes = Self::id_to_bytes(id.value());
        let completed_at = recap_domain::time::now_millis() as i64;

        // IMMEDIATE takes the write lock up front so two writers cannot both
        // observe `processing`.
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let updated = match &outcome {
            JobOutcome::Ready {
                raw_output,
                parse_degraded,
                ..
            } => tx.execute(
                "UPDATE extraction_jobs
                 SET status = 'ready', raw_output = ?2, parse_degraded = ?3, error = NULL,
                     completed_at = ?4
                 WHERE id = ?1 AND status = 'processing'",
                params![&id_bytes, raw_output, parse_degraded, completed_at],
            )?,
            JobOutcome::Failed { error } => tx.execute(
                "UPDATE extraction_jobs
                 SET status = 'failed', error = ?2, completed_at = ?3
                 WHERE id = ?1 AND status = 'processing'",
                params![&id_bytes, error, completed_at],
            )?,
        };

        if updated == 0 {
            let current: Option<String> = tx
                .query_row(
                    "SELECT status FROM extraction_jobs WHERE id = ?1",
                    params![&id_bytes],
                    |row| row.get(0),
                )
                .optional()?;

            return match current {
                None => Err(StoreError::NotFound(format!("job {}", id))),
                Some(status) => {
                    warn!(
                        "Refusing {} transition for job {}: already {}",
                        outcome.status().as_str(),
                        id,
                        status
                    );
                    Err(StoreError::InvalidTransition { job: id, status })
                }
            };
        }

        if let JobOutcome::Ready { items, .. } = &outcome {
            for (position, item) in items.iter().enumerate() {
                if item.job_id != id {
                    return Err(StoreError::InvalidData(format!(
                        "item {} belongs to job {}, not {}",
                        item.id, item.job_id, id
                    )));
                }
                Self::insert_item(&tx, position, item)?;
            }
            debug!("Inserted {} items for job {}", items.len(), id);
        }

        tx.commit()?;
        Ok(())
    }

    fn list_items(&self, job: JobId) -> Result<Vec<ExtractedItem>, Self::Error> {
        let sql = format!(
            "SELECT {} FROM extracted_items WHERE job_id = ?1 ORDER BY position ASC",
            ITEM_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let items = stmt
            .query_map(params![Self::id_to_bytes(job.value())], Self::row_to_item)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(items)
    }

    fn get_item(&self, id: ItemId) -> Result<Option<ExtractedItem>, Self::Error> {
        let sql = format!("SELECT {} FROM extracted_items WHERE id = ?1", ITEM_COLUMNS);
        let item = self
            .conn
            .query_row(&sql, params![Self::id_to_bytes(id.value())], Self::row_to_item)
            .optional()?;

        Ok(item)
    }

    fn record_edit(&mut self, item: &ExtractedItem, edit: ItemEdit) -> Result<(), Self::Error> {
        if edit.item_id != item.id {
            return Err(StoreError::InvalidData(format!(
                "edit {} targets item {}, not {}",
                edit.id, edit.item_id, item.id
            )));
        }

        let item_bytes = Self::id_to_bytes(item.id.value());
        let review_reasons = item
            .review_reasons
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let prev_json = serde_json::to_string(&edit.prev)?;
        let next_json = serde_json::to_string(&edit.next)?;

        let tx = self.conn.transaction()?;

        let updated = tx.execute(
            "UPDATE extracted_items
             SET title = ?2, details = ?3, speaker = ?4, timestamp_start = ?5, timestamp_end = ?6,
                 status = ?7, needs_review = ?8, review_reasons = ?9
             WHERE id = ?1",
            params![
                &item_bytes,
                &item.title,
                &item.details,
                &item.speaker,
                &item.timestamp_start,
                &item.timestamp_end,
                item.status.as_str(),
                item.needs_review,
                review_reasons,
            ],
        )?;

        if updated == 0 {
            return Err(StoreError::NotFound(format!("item {}", item.id)));
        }

        tx.execute(
            "INSERT INTO item_edits (id, item_id, editor, prev_json, next_json, reason, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                Self::id_to_bytes(edit.id.value()),
                &item_bytes,
                &edit.editor,
                prev_json,
                next_json,
                &edit.reason,
                edit.created_at as i64,
            ],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn list_edits(&self, item: ItemId) -> Result<Vec<ItemEdit>, Self::Error> {
        let sql = format!(
            "SELECT {} FROM item_edits WHERE item_id = ?1 ORDER BY created_at ASC, rowid ASC",
            EDIT_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let edits = stmt
            .query_map(params![Self::id_to_bytes(item.value())], Self::row_to_edit)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(edits)
    }
}
