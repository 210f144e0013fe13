//! Recap Domain Layer
//!
//! This crate contains the domain model for Recap's structured-extraction
//! pipeline. It defines the records a job produces, the value objects that
//! describe them, and the trait interfaces that infrastructure crates implement.
//!
//! ## Key Concepts
//!
//! - **Transcript**: The source text a job extracts from
//! - **Extraction Job**: One attempt over one transcript (`processing` → `ready` | `failed`)
//! - **Extracted Item**: A typed, evidence-anchored, confidence-scored finding
//! - **Item Edit**: An append-only before/after record of a human correction
//!
//! ## Architecture
//!
//! - Only `uuid` (identifiers) and `serde` (JSON boundary) as external dependencies
//! - Pure business logic only
//! - Persistence and model inference live in other crates behind the traits in [`traits`]

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod edit;
pub mod ids;
pub mod item;
pub mod job;
pub mod time;
pub mod traits;
pub mod transcript;

// Re-exports for convenience
pub use edit::{apply_edit, ItemChanges, ItemEdit, ItemSnapshot};
pub use ids::{EditId, ItemId, JobId, TranscriptId};
pub use item::{ExtractedItem, FieldConfidence, ItemCategory, ItemStatus};
pub use job::{ExtractionJob, JobOutcome, JobStatus};
pub use transcript::Transcript;
