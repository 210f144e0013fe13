//! Repaired response → scored drafts → items

use crate::normalize::{normalize_entry, NormalizedEntry};
use crate::repair::RepairedResponse;
use crate::scoring::{Score, ScoringPolicy};
use recap_domain::{ExtractedItem, ItemCategory, ItemId, JobId};
use tracing::debug;

/// A normalized and scored entry, not yet bound to a job
#[derive(Debug, Clone, PartialEq)]
pub struct ItemDraft {
    /// Cleaned fields
    pub entry: NormalizedEntry,
    /// Score and review gate
    pub score: Score,
}

impl ItemDraft {
    /// Bind the draft to a job as a new item
    pub fn into_item(self, job_id: JobId, created_at: u64) -> ExtractedItem {
        let status = self.score.initial_status();
        let review_reasons = self.score.review_reasons();
        ExtractedItem {
            id: ItemId::new(),
            job_id,
            category: self.entry.category,
            title: self.entry.title,
            details: self.entry.details,
            speaker: self.entry.speaker,
            timestamp_start: self.entry.timestamp_start,
            timestamp_end: self.entry.timestamp_end,
            confidence: self.score.confidence,
            field_confidence: self.score.field_confidence,
            needs_review: self.score.needs_review,
            review_reasons,
            status,
            created_at,
        }
    }
}

/// Normalize and score every entry of every category
///
/// Drafts come out in category order, then source order within a category.
/// The result depends only on `response` and `policy`.
pub fn draft_items(response: &RepairedResponse, policy: &ScoringPolicy) -> Vec<ItemDraft> {
    let mut drafts = Vec::new();

    for category in ItemCategory::ALL {
        let entries = response.entries(category);
        let before = drafts.len();

        drafts.extend(
            entries
                .iter()
                .filter_map(|entry| normalize_entry(category, entry))
                .map(|entry| {
                    let score = policy.score(&entry);
                    ItemDraft { entry, score }
                }),
        );

        debug!(
            "{}: {} entries, {} kept",
            category.as_str(),
            entries.len(),
            drafts.len() - before
        );
    }

    drafts
}

/// Turn drafts into items of `job_id`, preserving order
pub fn materialize(job_id: JobId, drafts: Vec<ItemDraft>) -> Vec<ExtractedItem> {
    let created_at = recap_domain::time::now_millis();
    drafts
        .into_iter()
        .map(|draft| draft.into_item(job_id, created_at))
        .collect()
}
