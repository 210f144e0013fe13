//! Configuration for the extraction runner

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable overriding [`ExtractorConfig::auto_approve_threshold`]
pub const ENV_AUTO_APPROVE_THRESHOLD: &str = "RECAP_AUTO_APPROVE_THRESHOLD";
/// Environment variable overriding [`ExtractorConfig::inference_timeout_secs`]
pub const ENV_INFERENCE_TIMEOUT_SECS: &str = "RECAP_INFERENCE_TIMEOUT_SECS";
/// Environment variable overriding [`ExtractorConfig::default_model`]
pub const ENV_DEFAULT_MODEL: &str = "RECAP_DEFAULT_MODEL";

/// Configuration for the extraction runner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Items scoring at or above this confidence are created `approved`
    pub auto_approve_threshold: f64,

    /// Transcript text beyond this many characters is not sent to the model
    pub max_transcript_chars: usize,

    /// Maximum time for a single model call (seconds)
    pub inference_timeout_secs: u64,

    /// Model used when a job asks for the default
    pub default_model: Option<String>,
}

impl ExtractorConfig {
    /// Get the inference timeout as a Duration
    pub fn inference_timeout(&self) -> Duration {
        Duration::from_secs(self.inference_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.auto_approve_threshold) {
            return Err(format!(
                "auto_approve_threshold must be within [0, 1], got {}",
                self.auto_approve_threshold
            ));
        }
        if self.max_transcript_chars == 0 {
            return Err("max_transcript_chars must be greater than 0".to_string());
        }
        if self.inference_timeout_secs == 0 {
            return Err("inference_timeout_secs must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            auto_approve_threshold: 0.78,
            max_transcript_chars: 30_000,
            inference_timeout_secs: 120,
            default_model: None,
        }
    }
}

impl ExtractorConfig {
    /// Strict preset: only near-complete items are auto-approved
    pub fn strict() -> Self {
        Self {
            auto_approve_threshold: 0.9,
            ..Self::default()
        }
    }

    /// Permissive preset: most attributed items are auto-approved
    pub fn permissive() -> Self {
        Self {
            auto_approve_threshold: 0.6,
            ..Self::default()
        }
    }

    /// Apply `RECAP_*` environment overrides
    pub fn with_env_overrides(self) -> Result<Self, String> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        if let Some(value) = lookup(ENV_AUTO_APPROVE_THRESHOLD) {
            self.auto_approve_threshold = value
                .trim()
                .parse()
                .map_err(|e| format!("{}: {}", ENV_AUTO_APPROVE_THRESHOLD, e))?;
        }
        if let Some(value) = lookup(ENV_INFERENCE_TIMEOUT_SECS) {
            self.inference_timeout_secs = value
                .trim()
                .parse()
                .map_err(|e| format!("{}: {}", ENV_INFERENCE_TIMEOUT_SECS, e))?;
        }
        if let Some(value) = lookup(ENV_DEFAULT_MODEL) {
            let value = value.trim();
            self.default_model = (!value.is_empty()).then(|| value.to_string());
        }
        Ok(self)
    }
}
