//! Heuristic confidence scoring and review gating
//!
//! A pure function of a normalized entry: no I/O, no randomness. The score
//! starts at a baseline, gains for every field the model filled in, loses for
//! category-specific gaps, and is clamped to `[MIN_CONFIDENCE, MAX_CONFIDENCE]`.

use crate::normalize::NormalizedEntry;
use recap_domain::{FieldConfidence, ItemCategory, ItemStatus};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// Score before any field is considered
pub const BASELINE: f64 = 0.45;
/// Lowest confidence an item can receive
pub const MIN_CONFIDENCE: f64 = 0.05;
/// Highest confidence an item can receive
pub const MAX_CONFIDENCE: f64 = 0.95;
/// Threshold used when none is configured
pub const DEFAULT_AUTO_APPROVE_THRESHOLD: f64 = 0.78;

/// Score gained when a field is present, and its field confidence either way
#[derive(Debug, Clone, Copy)]
struct Weight {
    delta: f64,
    hit: f64,
    miss: f64,
}

const TITLE: Weight = Weight { delta: 0.15, hit: 0.9, miss: 0.2 };
const DETAILS: Weight = Weight { delta: 0.08, hit: 0.75, miss: 0.45 };
const SPEAKER: Weight = Weight { delta: 0.08, hit: 0.8, miss: 0.45 };
const TIMESTAMP: Weight = Weight { delta: 0.08, hit: 0.8, miss: 0.45 };
const EVIDENCE: Weight = Weight { delta: 0.06, hit: 0.75, miss: 0.4 };

static SPECIFIC_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d+\.?\d*)\b").expect("number pattern is valid"));

/// Why an item was flagged for review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReviewReason {
    /// No title (cannot happen for entries that survived normalization)
    MissingTitle,
    /// No speaker attribution
    MissingSpeaker,
    /// No start timestamp
    MissingTimestamp,
    /// Action item without an owner
    MissingOwner,
    /// Action item without a due date
    MissingDueDate,
    /// Decision without a rationale
    MissingRationale,
    /// Estimate without a number in its title or details
    EstimateNotSpecific,
}

impl ReviewReason {
    /// Stable reason code stored on items
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewReason::MissingTitle => "missing_title",
            ReviewReason::MissingSpeaker => "missing_speaker",
            ReviewReason::MissingTimestamp => "missing_timestamp",
            ReviewReason::MissingOwner => "missing_owner",
            ReviewReason::MissingDueDate => "missing_due_date",
            ReviewReason::MissingRationale => "missing_rationale",
            ReviewReason::EstimateNotSpecific => "estimate_not_specific",
        }
    }
}

impl fmt::Display for ReviewReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of scoring one entry
#[derive(Debug, Clone, PartialEq)]
pub struct Score {
    /// Overall confidence in `[MIN_CONFIDENCE, MAX_CONFIDENCE]`
    pub confidence: f64,
    /// Per-field reliability estimates
    pub field_confidence: FieldConfidence,
    /// Confidence fell below the auto-approve threshold
    pub needs_review: bool,
    /// Triggered reasons, in evaluation order
    pub reasons: Vec<ReviewReason>,
}

impl Score {
    /// Status an item with this score is created in
    pub fn initial_status(&self) -> ItemStatus {
        if self.needs_review {
            ItemStatus::Pending
        } else {
            ItemStatus::Approved
        }
    }

    /// Reason codes as stored: `None` rather than an empty list
    pub fn review_reasons(&self) -> Option<Vec<String>> {
        if self.reasons.is_empty() {
            None
        } else {
            Some(self.reasons.iter().map(|r| r.as_str().to_string()).collect())
        }
    }
}

/// Scoring policy; the auto-approve threshold is its only parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringPolicy {
    auto_approve_threshold: f64,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_AUTO_APPROVE_THRESHOLD)
    }
}

impl ScoringPolicy {
    /// Create a policy approving items at or above `auto_approve_threshold`
    pub fn new(auto_approve_threshold: f64) -> Self {
        Self {
            auto_approve_threshold,
        }
    }

    /// The configured threshold
    pub fn auto_approve_threshold(&self) -> f64 {
        self.auto_approve_threshold
    }

    /// Score a normalized entry
    ///
    /// # Examples
    ///
    /// ```
    /// use recap_domain::{ItemCategory, ItemStatus};
    /// use recap_extractor::{normalize_entry, ScoringPolicy};
    /// use serde_json::json;
    ///
    /// let entry = normalize_entry(ItemCategory::Decision, &json!({"title": "Ship v2"})).unwrap();
    /// let score = ScoringPolicy::default().score(&entry);
    ///
    /// assert!((score.confidence - 0.54).abs() < 1e-9);
    /// assert_eq!(score.initial_status(), ItemStatus::Pending);
    /// ```
    pub fn score(&self, entry: &NormalizedEntry) -> Score {
        let mut confidence = BASELINE;
        let mut field_confidence = FieldConfidence::new();
        let mut reasons = Vec::new();

        let mut contribute =
            |field: &str, present: bool, weight: Weight, reason: Option<ReviewReason>| {
                if present {
                    confidence += weight.delta;
                    field_confidence.insert(field.to_string(), weight.hit);
                } else {
                    field_confidence.insert(field.to_string(), weight.miss);
                    if let Some(reason) = reason {
                        reasons.push(reason);
                    }
                }
            };

        contribute(
            "title",
            !entry.title.trim().is_empty(),
            TITLE,
            Some(ReviewReason::MissingTitle),
        );
        contribute("details", has_text(&entry.details), DETAILS, None);
        contribute(
            "speaker",
            has_text(&entry.speaker),
            SPEAKER,
            Some(ReviewReason::MissingSpeaker),
        );
        contribute(
            "timestamp_start",
            has_text(&entry.timestamp_start),
            TIMESTAMP,
            Some(ReviewReason::MissingTimestamp),
        );
        contribute("evidence", !entry.contexts.is_empty(), EVIDENCE, None);

        match entry.category {
            ItemCategory::ActionItem => {
                if !entry.has_owner {
                    reasons.push(ReviewReason::MissingOwner);
                    confidence -= 0.08;
                }
                if !entry.has_due {
                    reasons.push(ReviewReason::MissingDueDate);
                    confidence -= 0.03;
                }
            }
            ItemCategory::Decision => {
                if !entry.has_rationale {
                    reasons.push(ReviewReason::MissingRationale);
                    confidence -= 0.06;
                }
            }
            ItemCategory::Estimate => {
                let text = format!("{} {}", entry.title, entry.details.as_deref().unwrap_or(""));
                if !SPECIFIC_NUMBER.is_match(&text) {
                    reasons.push(ReviewReason::EstimateNotSpecific);
                    confidence -= 0.06;
                }
            }
            _ => {}
        }

        let confidence = confidence.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE);

        Score {
            confidence,
            field_confidence,
            needs_review: confidence < self.auto_approve_threshold,
            reasons,
        }
    }
}

fn has_text(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}
