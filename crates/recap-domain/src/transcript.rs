//! Transcript module - the source text an extraction job reads

use crate::TranscriptId;
use serde::{Deserialize, Serialize};

/// One stored version of a meeting transcript
///
/// Transcripts are immutable; uploading a corrected transcript creates a new
/// version with a new identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    /// Unique identifier
    pub id: TranscriptId,

    /// Full transcript text as uploaded
    pub raw_text: String,

    /// When this version was stored (ms since epoch)
    pub created_at: u64,
}

impl Transcript {
    /// Create a new transcript version stamped with the current time
    pub fn new(raw_text: impl Into<String>) -> Self {
        Self {
            id: TranscriptId::new(),
            raw_text: raw_text.into(),
            created_at: crate::time::now_millis(),
        }
    }
}
