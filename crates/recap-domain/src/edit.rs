//! Edit audit module - append-only history of human corrections
//!
//! Every mutation of an [`ExtractedItem`] goes through [`apply_edit`], which
//! captures the full mutable field set before and after the change. The
//! resulting [`ItemEdit`] is never updated or deleted; ordering edits by
//! creation time reconstructs an item's history.
//!
//! Edits never trigger re-scoring. Confidence stays as computed at creation,
//! and status/needs_review change only when the edit sets them.

use crate::{EditId, ExtractedItem, ItemId, ItemStatus};
use serde::{Deserialize, Deserializer, Serialize};

/// The mutable field set of an item at one point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSnapshot {
    /// Title
    pub title: String,
    /// Details text
    pub details: Option<String>,
    /// Speaker
    pub speaker: Option<String>,
    /// Start timestamp
    pub timestamp_start: Option<String>,
    /// End timestamp
    pub timestamp_end: Option<String>,
    /// Review state
    pub status: ItemStatus,
    /// Review flag
    pub needs_review: bool,
    /// Review reason codes
    pub review_reasons: Option<Vec<String>>,
}

impl ItemSnapshot {
    /// Capture the mutable fields of an item
    pub fn of(item: &ExtractedItem) -> Self {
        Self {
            title: item.title.clone(),
            details: item.details.clone(),
            speaker: item.speaker.clone(),
            timestamp_start: item.timestamp_start.clone(),
            timestamp_end: item.timestamp_end.clone(),
            status: item.status,
            needs_review: item.needs_review,
            review_reasons: item.review_reasons.clone(),
        }
    }
}

/// A partial update to an item's mutable fields
///
/// `None` leaves a field untouched. For nullable fields, `Some(None)` clears
/// the value; in JSON that is an explicit `null`, while an absent key keeps it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ItemChanges {
    /// New title
    #[serde(default)]
    pub title: Option<String>,

    /// New details (`Some(None)` clears)
    #[serde(default, deserialize_with = "present")]
    pub details: Option<Option<String>>,

    /// New speaker (`Some(None)` clears)
    #[serde(default, deserialize_with = "present")]
    pub speaker: Option<Option<String>>,

    /// New start timestamp (`Some(None)` clears)
    #[serde(default, deserialize_with = "present")]
    pub timestamp_start: Option<Option<String>>,

    /// New end timestamp (`Some(None)` clears)
    #[serde(default, deserialize_with = "present")]
    pub timestamp_end: Option<Option<String>>,

    /// New review state
    #[serde(default)]
    pub status: Option<ItemStatus>,

    /// New review flag
    #[serde(default)]
    pub needs_review: Option<bool>,

    /// New reason codes (`Some(None)` clears)
    #[serde(default, deserialize_with = "present")]
    pub review_reasons: Option<Option<Vec<String>>>,
}

impl ItemChanges {
    /// True when the change set touches no field
    pub fn is_empty(&self) -> bool {
        self == &ItemChanges::default()
    }
}

/// Marks a key as present so that `null` deserializes to `Some(None)`
fn present<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Append-only audit record for one mutation of an item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemEdit {
    /// Unique identifier
    pub id: EditId,

    /// Edited item
    pub item_id: ItemId,

    /// Identity of the editor, if known
    pub editor: Option<String>,

    /// Field values immediately before the edit
    pub prev: ItemSnapshot,

    /// Field values immediately after the edit
    pub next: ItemSnapshot,

    /// Free-text justification
    pub reason: Option<String>,

    /// When the edit was made (ms since epoch)
    pub created_at: u64,
}

/// Apply `changes` to `item` and return the audit record describing it
///
/// Only fields present in `changes` are modified. No validation beyond the
/// field types is performed and nothing is re-scored.
///
/// # Examples
///
/// ```
/// use recap_domain::{apply_edit, ItemChanges, ItemStatus};
/// # use recap_domain::{ExtractedItem, ItemCategory, ItemId, JobId};
/// # let mut item = ExtractedItem {
/// #     id: ItemId::new(), job_id: JobId::new(), category: ItemCategory::Decision,
/// #     title: "Ship v2".into(), details: None, speaker: None,
/// #     timestamp_start: None, timestamp_end: None, confidence: 0.54,
/// #     field_confidence: Default::default(), needs_review: true,
/// #     review_reasons: None, status: ItemStatus::Pending, created_at: 0,
/// # };
///
/// let changes = ItemChanges {
///     status: Some(ItemStatus::Approved),
///     ..Default::default()
/// };
/// let edit = apply_edit(&mut item, changes, None, Some("priya".into()));
///
/// assert_eq!(edit.prev.status, ItemStatus::Pending);
/// assert_eq!(edit.next.status, ItemStatus::Approved);
/// assert_eq!(item.status, ItemStatus::Approved);
/// ```
pub fn apply_edit(
    item: &mut ExtractedItem,
    changes: ItemChanges,
    reason: Option<String>,
    editor: Option<String>,
) -> ItemEdit {
    let prev = ItemSnapshot::of(item);

    if let Some(title) = changes.title {
        item.title = title;
    }
    if let Some(details) = changes.details {
        item.details = details;
    }
    if let Some(speaker) = changes.speaker {
        item.speaker = speaker;
    }
    if let Some(start) = changes.timestamp_start {
        item.timestamp_start = start;
    }
    if let Some(end) = changes.timestamp_end {
        item.timestamp_end = end;
    }
    if let Some(status) = changes.status {
        item.status = status;
    }
    if let Some(needs_review) = changes.needs_review {
        item.needs_review = needs_review;
    }
    if let Some(reasons) = changes.review_reasons {
        item.review_reasons = reasons;
    }

    let next = ItemSnapshot::of(item);

    ItemEdit {
        id: EditId::new(),
        item_id: item.id,
        editor,
        prev,
        next,
        reason,
        created_at: crate::time::now_millis(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ItemCategory, JobId};

    fn sample_item() -> ExtractedItem {
        ExtractedItem {
            id: ItemId::new(),
            job_id: JobId::new(),
            category: ItemCategory::ActionItem,
            title: "Write migration".to_string(),
            details: Some("Owner: Priya".to_string()),
            speaker: Some("Alex".to_string()),
            timestamp_start: Some("00:05:22".to_string()),
            timestamp_end: None,
            confidence: 0.7,
            field_confidence: Default::default(),
            needs_review: true,
            review_reasons: Some(vec!["missing_due_date".to_string()]),
            status: ItemStatus::Pending,
            created_at: 1000,
        }
    }

    #[test]
    fn test_snapshots_bracket_the_change() {
        let mut item = sample_item();
        let before = ItemSnapshot::of(&item);

        let changes = ItemChanges {
            title: Some("Write the migration".to_string()),
            ..Default::default()
        };
        let edit = apply_edit(&mut item, changes, Some("typo".to_string()), None);

        assert_eq!(edit.prev, before);
        assert_eq!(edit.next, ItemSnapshot::of(&item));
        assert_eq!(edit.next.title, "Write the migration");
        assert_eq!(edit.reason.as_deref(), Some("typo"));
        assert_eq!(edit.item_id, item.id);
    }

    #[test]
    fn test_absent_fields_are_unchanged() {
        let mut item = sample_item();
        let changes = ItemChanges {
            status: Some(ItemStatus::Rejected),
            ..Default::default()
        };
        let edit = apply_edit(&mut item, changes, None, None);

        assert_eq!(edit.next.status, ItemStatus::Rejected);
        assert_eq!(edit.next.title, edit.prev.title);
        assert_eq!(edit.next.details, edit.prev.details);
        assert_eq!(edit.next.speaker, edit.prev.speaker);
        assert_eq!(edit.next.timestamp_start, edit.prev.timestamp_start);
        assert_eq!(edit.next.needs_review, edit.prev.needs_review);
        assert_eq!(edit.next.review_reasons, edit.prev.review_reasons);
    }

    #[test]
    fn test_edit_does_not_rescore() {
        let mut item = sample_item();
        let changes = ItemChanges {
            speaker: Some(None),
            ..Default::default()
        };
        apply_edit(&mut item, changes, None, None);

        assert_eq!(item.confidence, 0.7);
        assert_eq!(item.status, ItemStatus::Pending);
        assert!(item.speaker.is_none());
    }

    #[test]
    fn test_json_null_clears_absent_keeps() {
        let changes: ItemChanges =
            serde_json::from_str(r#"{"speaker": null, "status": "approved"}"#).unwrap();

        assert_eq!(changes.speaker, Some(None));
        assert_eq!(changes.details, None);
        assert_eq!(changes.status, Some(ItemStatus::Approved));

        let mut item = sample_item();
        apply_edit(&mut item, changes, None, None);
        assert!(item.speaker.is_none());
        assert_eq!(item.details.as_deref(), Some("Owner: Priya"));
    }

    #[test]
    fn test_empty_changes() {
        assert!(ItemChanges::default().is_empty());
        let changes: ItemChanges = serde_json::from_str("{}").unwrap();
        assert!(changes.is_empty());
    }

    #[test]
    fn test_empty_edit_still_recorded() {
        let mut item = sample_item();
        let edit = apply_edit(&mut item, ItemChanges::default(), None, Some("sam".to_string()));
        assert_eq!(edit.prev, edit.next);
        assert_eq!(edit.editor.as_deref(), Some("sam"));
    }
}
