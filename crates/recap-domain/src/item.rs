//! Extracted item module - one materialized finding of an extraction job

use crate::{ItemId, JobId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-field reliability estimates in [0, 1], keyed by field name
pub type FieldConfidence = BTreeMap<String, f64>;

/// Category of an extracted finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemCategory {
    /// One bullet of the meeting summary
    Summary,

    /// A committed choice
    Decision,

    /// A task with explicit responsibility
    ActionItem,

    /// An unresolved question
    OpenQuestion,

    /// A numeric or otherwise concrete estimate
    Estimate,

    /// A stated risk
    Risk,
}

impl ItemCategory {
    /// Every category in materialization order
    pub const ALL: [ItemCategory; 6] = [
        ItemCategory::Summary,
        ItemCategory::Decision,
        ItemCategory::ActionItem,
        ItemCategory::OpenQuestion,
        ItemCategory::Estimate,
        ItemCategory::Risk,
    ];

    /// Get the category name as stored on an item
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemCategory::Summary => "summary",
            ItemCategory::Decision => "decision",
            ItemCategory::ActionItem => "action_item",
            ItemCategory::OpenQuestion => "open_question",
            ItemCategory::Estimate => "estimate",
            ItemCategory::Risk => "risk",
        }
    }

    /// Key holding this category's entries in a model response
    pub fn source_key(&self) -> &'static str {
        match self {
            ItemCategory::Summary => "summary",
            ItemCategory::Decision => "decisions",
            ItemCategory::ActionItem => "action_items",
            ItemCategory::OpenQuestion => "open_questions",
            ItemCategory::Estimate => "estimates",
            ItemCategory::Risk => "risks",
        }
    }

    /// Parse a category from its item name
    pub fn parse(s: &str) -> Option<Self> {
        ItemCategory::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

/// Review state of an extracted item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    /// Awaiting human review
    Pending,

    /// Accepted, either automatically or by a reviewer
    Approved,

    /// Rejected by a reviewer
    Rejected,
}

impl ItemStatus {
    /// Get the status name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Pending => "pending",
            ItemStatus::Approved => "approved",
            ItemStatus::Rejected => "rejected",
        }
    }

    /// Parse a status from its string form
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(ItemStatus::Pending),
            "approved" => Some(ItemStatus::Approved),
            "rejected" => Some(ItemStatus::Rejected),
            _ => None,
        }
    }
}

/// A materialized finding belonging to an extraction job
///
/// Items are immutable once created except through an explicit edit
/// (see [`crate::edit::apply_edit`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedItem {
    /// Unique identifier
    pub id: ItemId,

    /// Owning job
    pub job_id: JobId,

    /// Finding category
    pub category: ItemCategory,

    /// Short title, never empty at creation
    pub title: String,

    /// Free text, may embed subsidiary facts and evidence quotes
    pub details: Option<String>,

    /// Speaker the finding is attributed to
    pub speaker: Option<String>,

    /// Canonical `MM:SS` / `HH:MM:SS` start timestamp
    pub timestamp_start: Option<String>,

    /// Canonical `MM:SS` / `HH:MM:SS` end timestamp
    pub timestamp_end: Option<String>,

    /// Overall confidence in [0.05, 0.95]
    pub confidence: f64,

    /// Per-field confidence map
    pub field_confidence: FieldConfidence,

    /// Whether confidence fell below the auto-approve threshold at creation
    pub needs_review: bool,

    /// Ordered reason codes; `None` rather than an empty list
    pub review_reasons: Option<Vec<String>>,

    /// Review state
    pub status: ItemStatus,

    /// When the item was created (ms since epoch)
    pub created_at: u64,
}
