//! Extraction job module - one extraction attempt over one transcript version

use crate::{ExtractedItem, JobId, TranscriptId};
use serde::{Deserialize, Serialize};

/// Lifecycle state of an extraction job
///
/// A job is created in `Processing` and transitions exactly once to either
/// `Ready` or `Failed`. Both terminal states are final; a retry is a new job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Background task has not yet committed a terminal state
    Processing,

    /// Items were materialized and committed
    Ready,

    /// The job failed; `ExtractionJob::error` explains why
    Failed,
}

impl JobStatus {
    /// Get the status name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Processing => "processing",
            JobStatus::Ready => "ready",
            JobStatus::Failed => "failed",
        }
    }

    /// Parse a status from its string form
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "processing" => Some(JobStatus::Processing),
            "ready" => Some(JobStatus::Ready),
            "failed" => Some(JobStatus::Failed),
            _ => None,
        }
    }

    /// Whether no further transition is possible
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Processing)
    }
}

/// One extraction attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionJob {
    /// Unique identifier
    pub id: JobId,

    /// Transcript version this job reads
    pub transcript_id: TranscriptId,

    /// Requested model identifier (`None` means the configured default)
    pub model: Option<String>,

    /// Current lifecycle state
    pub status: JobStatus,

    /// Repaired model output re-serialized as JSON, kept for audit
    pub raw_output: Option<String>,

    /// True when the model output could not be recovered as a JSON object
    /// and the job degraded to an empty finding set
    pub parse_degraded: bool,

    /// Failure description for `Failed` jobs
    pub error: Option<String>,

    /// When the job was created (ms since epoch)
    pub created_at: u64,

    /// When the job reached a terminal state (ms since epoch)
    pub completed_at: Option<u64>,
}

impl ExtractionJob {
    /// Create a new job in the `Processing` state
    pub fn new(transcript_id: TranscriptId, model: Option<String>) -> Self {
        Self {
            id: JobId::new(),
            transcript_id,
            model,
            status: JobStatus::Processing,
            raw_output: None,
            parse_degraded: false,
            error: None,
            created_at: crate::time::now_millis(),
            completed_at: None,
        }
    }
}

/// Terminal result handed to the persistence boundary in one piece
///
/// Persisting an outcome is all-or-nothing: either the status, raw output and
/// every item are committed together, or nothing is.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    /// Transition to `Ready` with the materialized items
    Ready {
        /// Repaired model output, if it could be serialized
        raw_output: Option<String>,
        /// Whether the model output degraded to an empty mapping
        parse_degraded: bool,
        /// Items in materialization order
        items: Vec<ExtractedItem>,
    },

    /// Transition to `Failed`
    Failed {
        /// Error text exposed to callers
        error: String,
    },
}

impl JobOutcome {
    /// Status this outcome transitions the job into
    pub fn status(&self) -> JobStatus {
        match self {
            JobOutcome::Ready { .. } => JobStatus::Ready,
            JobOutcome::Failed { .. } => JobStatus::Failed,
        }
    }
}
