//! Replay provider
//!
//! Answers every call with a model response recorded earlier to a file. The
//! file is read at call time, so a missing or unreadable recording surfaces
//! as an upstream failure of the job rather than a startup error.

use crate::LlmError;
use recap_domain::traits::InferenceProvider;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Inference provider that replays a recorded response
///
/// # Examples
///
/// ```no_run
/// use recap_llm::ReplayProvider;
/// use recap_domain::traits::InferenceProvider;
///
/// let provider = ReplayProvider::new("recordings/standup.json");
/// let raw = provider.infer("transcript text", None).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct ReplayProvider {
    path: PathBuf,
}

impl ReplayProvider {
    /// Create a provider replaying the file at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the recording
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl InferenceProvider for ReplayProvider {
    type Error = LlmError;

    fn infer(&self, transcript: &str, model: Option<&str>) -> Result<String, Self::Error> {
        debug!(
            "Replaying {} for transcript of {} chars (model: {})",
            self.path.display(),
            transcript.chars().count(),
            model.unwrap_or("default")
        );

        std::fs::read_to_string(&self.path)
            .map_err(|e| LlmError::Replay(format!("{}: {}", self.path.display(), e)))
    }
}
