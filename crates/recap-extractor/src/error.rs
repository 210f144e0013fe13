//! Error types for the extraction runner

use recap_domain::{ItemId, JobId, JobStatus};
use thiserror::Error;

/// Errors surfaced to callers of the runner
///
/// Job failures are not errors here: a job that fails is recorded as
/// `failed` and returned normally. These variants cover requests that could
/// not be carried out at all.
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// Persistence boundary error
    #[error("Store error: {0}")]
    Store(String),

    /// No job with this id
    #[error("Job not found: {0}")]
    JobNotFound(JobId),

    /// No item with this id
    #[error("Item not found: {0}")]
    ItemNotFound(ItemId),

    /// Another run of the same job is already executing in this process
    #[error("Job {0} is already running")]
    JobInFlight(JobId),

    /// The job already reached a terminal state
    #[error("Job {job} already finished as {}", status.as_str())]
    JobFinished {
        /// Job that was asked to run again
        job: JobId,
        /// Its terminal status
        status: JobStatus,
    },

    /// A background job task was cancelled or panicked
    #[error("Task error: {0}")]
    Task(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<tokio::task::JoinError> for ExtractorError {
    fn from(e: tokio::task::JoinError) -> Self {
        ExtractorError::Task(e.to_string())
    }
}
