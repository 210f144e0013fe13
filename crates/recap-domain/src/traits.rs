//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the extraction pipeline and
//! infrastructure. Implementations live in other crates.

use crate::{
    ExtractedItem, ExtractionJob, ItemEdit, ItemId, JobId, JobOutcome, Transcript, TranscriptId,
};

/// Trait for persisting transcripts, jobs, items and edits
///
/// Implemented by the infrastructure layer (recap-store). Every mutation is
/// expected to be transactional: fully applied or fully rolled back.
pub trait ExtractionStore {
    /// Error type for store operations
    type Error;

    /// Store a transcript version
    fn create_transcript(&mut self, transcript: Transcript) -> Result<TranscriptId, Self::Error>;

    /// Get a transcript version by ID
    fn get_transcript(&self, id: TranscriptId) -> Result<Option<Transcript>, Self::Error>;

    /// Store a newly created job
    fn create_job(&mut self, job: ExtractionJob) -> Result<JobId, Self::Error>;

    /// Get a job by ID
    fn get_job(&self, id: JobId) -> Result<Option<ExtractionJob>, Self::Error>;

    /// Commit the terminal transition of a `processing` job
    ///
    /// Status, raw output and items are written atomically. Implementations
    /// must refuse the transition when the job is no longer `processing`.
    fn complete_job(&mut self, id: JobId, outcome: JobOutcome) -> Result<(), Self::Error>;

    /// List a job's items in materialization order
    fn list_items(&self, job: JobId) -> Result<Vec<ExtractedItem>, Self::Error>;

    /// Get an item by ID
    fn get_item(&self, id: ItemId) -> Result<Option<ExtractedItem>, Self::Error>;

    /// Persist an edited item together with its audit record
    fn record_edit(&mut self, item: &ExtractedItem, edit: ItemEdit) -> Result<(), Self::Error>;

    /// List an item's edits, oldest first
    fn list_edits(&self, item: ItemId) -> Result<Vec<ItemEdit>, Self::Error>;
}

/// Trait for the generative model that reads a transcript
///
/// Implemented by the infrastructure layer (recap-llm). The call is a black
/// box: it receives the (already clipped) transcript and an optional model
/// identifier, and returns raw text that is supposed to be a JSON object.
pub trait InferenceProvider {
    /// Error type for inference operations
    type Error;

    /// Run structured extraction over a transcript
    ///
    /// `model` is `None` when the provider's default model should be used.
    fn infer(&self, transcript: &str, model: Option<&str>) -> Result<String, Self::Error>;
}
