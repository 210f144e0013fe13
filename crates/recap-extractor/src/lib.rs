//! Recap Extractor
//!
//! Turns a free-form model response into typed, evidence-anchored,
//! confidence-scored items and drives extraction jobs through their lifecycle.
//!
//! # Architecture
//!
//! ```text
//! Transcript → InferenceProvider → repair → normalize → score → ExtractionStore
//! ```
//!
//! - **repair**: recover a JSON object from fenced, chatty or truncated output
//! - **normalize**: one decode function per category; blank titles are dropped
//! - **score**: pure heuristic confidence and review gating
//! - **runner**: the `processing → ready | failed` state machine
//!
//! # Example Usage
//!
//! ```no_run
//! use recap_extractor::{ExtractionRunner, ExtractorConfig};
//! use recap_llm::MockProvider;
//! use recap_store::SqliteStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = MockProvider::new(r#"{"summary": ["Kickoff"]}"#);
//! let store = SqliteStore::new(":memory:")?;
//! let runner = ExtractionRunner::new(provider, store, ExtractorConfig::default())?;
//!
//! let transcript = runner.ingest("00:00:05 Alex: let's kick off")?;
//! let (job, handle) = runner.submit(transcript.id, None)?;
//! println!("Job {} is {}", job.id, job.status.as_str());
//!
//! let finished = handle.await??;
//! for item in runner.items(finished.id)? {
//!     println!("{} {:.2} {}", item.category.as_str(), item.confidence, item.title);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod normalize;
mod pipeline;
mod repair;
mod runner;
mod scoring;

#[cfg(test)]
mod tests;

pub use config::{
    ExtractorConfig, ENV_AUTO_APPROVE_THRESHOLD, ENV_DEFAULT_MODEL, ENV_INFERENCE_TIMEOUT_SECS,
};
pub use error::ExtractorError;
pub use normalize::{as_contexts, clean_timestamp, normalize_entry, NormalizedEntry, MAX_CONTEXTS};
pub use pipeline::{draft_items, materialize, ItemDraft};
pub use repair::{repair, RepairedResponse};
pub use runner::{ExtractionRunner, MISSING_TRANSCRIPT};
pub use scoring::{
    ReviewReason, Score, ScoringPolicy, BASELINE, DEFAULT_AUTO_APPROVE_THRESHOLD, MAX_CONFIDENCE,
    MIN_CONFIDENCE,
};
