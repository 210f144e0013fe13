//! Per-category cleaning of model entries
//!
//! Each category has its own decode function that pulls the fields it knows
//! about out of a loosely shaped JSON entry, cleans them, and folds the
//! subsidiary facts (owner, due date, rationale...) into the details text.
//! An entry that ends up without a title is dropped.

use recap_domain::ItemCategory;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

/// Maximum evidence quotes kept per item
pub const MAX_CONTEXTS: usize = 3;

static TIMESTAMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{1,2}:\d{2}(:\d{2})?$").expect("timestamp pattern is valid")
});

/// A cleaned entry, ready for scoring
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedEntry {
    /// Category the entry was listed under
    pub category: ItemCategory,
    /// Trimmed, non-empty title
    pub title: String,
    /// Details with subsidiary facts and evidence folded in
    pub details: Option<String>,
    /// Attributed speaker
    pub speaker: Option<String>,
    /// Canonical start timestamp
    pub timestamp_start: Option<String>,
    /// Canonical end timestamp
    pub timestamp_end: Option<String>,
    /// Up to [`MAX_CONTEXTS`] evidence quotes, in source order
    pub contexts: Vec<String>,
    /// The entry named an owner (or assignee)
    pub has_owner: bool,
    /// The entry named a due date
    pub has_due: bool,
    /// The entry gave a rationale
    pub has_rationale: bool,
}

/// Clean one entry listed under `category`
///
/// Returns `None` when the entry should be dropped: it has the wrong shape
/// or no usable title.
///
/// # Examples
///
/// ```
/// use recap_domain::ItemCategory;
/// use recap_extractor::normalize_entry;
/// use serde_json::json;
///
/// let entry = json!({"title": " Write migration ", "assignee": "Priya", "timestamp_start": 90});
/// let normalized = normalize_entry(ItemCategory::ActionItem, &entry).unwrap();
///
/// assert_eq!(normalized.title, "Write migration");
/// assert_eq!(normalized.details.as_deref(), Some("Owner: Priya"));
/// assert_eq!(normalized.timestamp_start.as_deref(), Some("01:30"));
/// assert!(normalized.has_owner && !normalized.has_due);
/// ```
pub fn normalize_entry(category: ItemCategory, entry: &Value) -> Option<NormalizedEntry> {
    match category {
        ItemCategory::Summary => summary(entry),
        ItemCategory::Decision => decision(entry.as_object()?),
        ItemCategory::ActionItem => action_item(entry.as_object()?),
        ItemCategory::OpenQuestion => open_question(entry.as_object()?),
        ItemCategory::Estimate => estimate(entry.as_object()?),
        ItemCategory::Risk => risk(entry.as_object()?),
    }
}

fn summary(entry: &Value) -> Option<NormalizedEntry> {
    let title = clean_str(entry)?;
    Some(NormalizedEntry {
        category: ItemCategory::Summary,
        title,
        details: None,
        speaker: None,
        timestamp_start: None,
        timestamp_end: None,
        contexts: Vec::new(),
        has_owner: false,
        has_due: false,
        has_rationale: false,
    })
}

fn decision(entry: &Map<String, Value>) -> Option<NormalizedEntry> {
    let rationale = field(entry, "rationale");
    let owner = field(entry, "owner");
    let due = field(entry, "due");

    let mut extras = Extras::default();
    extras.push("Rationale", rationale.as_deref());
    extras.push("Owner", owner.as_deref());
    extras.push("Due", due.as_deref());

    let details = field(entry, "details");
    let mut normalized =
        Common::read(ItemCategory::Decision, entry, &["title"])?.finish(details, extras);
    normalized.has_owner = owner.is_some();
    normalized.has_due = due.is_some();
    normalized.has_rationale = rationale.is_some();
    Some(normalized)
}

fn action_item(entry: &Map<String, Value>) -> Option<NormalizedEntry> {
    let assignee = field(entry, "assignee");
    let due = field(entry, "due");

    let mut extras = Extras::default();
    extras.push("Owner", assignee.as_deref());
    extras.push("Due", due.as_deref());

    let details = field(entry, "details");
    let mut normalized =
        Common::read(ItemCategory::ActionItem, entry, &["title"])?.finish(details, extras);
    normalized.has_owner = assignee.is_some();
    normalized.has_due = due.is_some();
    Some(normalized)
}

fn open_question(entry: &Map<String, Value>) -> Option<NormalizedEntry> {
    let owner = field(entry, "owner");

    let mut extras = Extras::default();
    extras.push("Owner", owner.as_deref());

    let mut normalized = Common::read(ItemCategory::OpenQuestion, entry, &["title", "question"])?
        .finish(None, extras);
    normalized.has_owner = owner.is_some();
    Some(normalized)
}

fn estimate(entry: &Map<String, Value>) -> Option<NormalizedEntry> {
    let owner = field(entry, "owner");

    let mut extras = Extras::default();
    extras.push("Owner", owner.as_deref());

    let details = field(entry, "details");
    let mut normalized = Common::read(ItemCategory::Estimate, entry, &["title", "estimate"])?
        .finish(details, extras);
    normalized.has_owner = owner.is_some();
    Some(normalized)
}

fn risk(entry: &Map<String, Value>) -> Option<NormalizedEntry> {
    let mitigation = field(entry, "mitigation");
    let owner = field(entry, "owner");

    let mut extras = Extras::default();
    extras.push("Mitigation", mitigation.as_deref());
    extras.push("Owner", owner.as_deref());

    let mut normalized =
        Common::read(ItemCategory::Risk, entry, &["title", "risk"])?.finish(None, extras);
    normalized.has_owner = owner.is_some();
    Some(normalized)
}

/// Fields every non-summary category shares
///
/// `details` is not among them: open questions and risks build their details
/// from subsidiary facts only.
struct Common {
    category: ItemCategory,
    title: String,
    speaker: Option<String>,
    timestamp_start: Option<String>,
    timestamp_end: Option<String>,
    contexts: Vec<String>,
}

impl Common {
    /// Read shared fields; the title is the first usable key of `title_keys`
    fn read(
        category: ItemCategory,
        entry: &Map<String, Value>,
        title_keys: &[&str],
    ) -> Option<Self> {
        let title = title_keys.iter().find_map(|key| field(entry, key))?;

        Some(Self {
            category,
            title,
            speaker: field(entry, "speaker"),
            timestamp_start: entry.get("timestamp_start").and_then(clean_timestamp),
            timestamp_end: entry.get("timestamp_end").and_then(clean_timestamp),
            contexts: entry.get("contexts").map(as_contexts).unwrap_or_default(),
        })
    }

    fn finish(self, details: Option<String>, extras: Extras) -> NormalizedEntry {
        let details = compose_details(details, &extras.0, &self.contexts);
        NormalizedEntry {
            category: self.category,
            title: self.title,
            details,
            speaker: self.speaker,
            timestamp_start: self.timestamp_start,
            timestamp_end: self.timestamp_end,
            contexts: self.contexts,
            has_owner: false,
            has_due: false,
            has_rationale: false,
        }
    }
}

/// `Label: value` fragments in declaration order
#[derive(Default)]
struct Extras(Vec<String>);

impl Extras {
    fn push(&mut self, label: &str, value: Option<&str>) {
        if let Some(value) = value {
            self.0.push(format!("{}: {}", label, value));
        }
    }
}

fn field(entry: &Map<String, Value>, key: &str) -> Option<String> {
    entry.get(key).and_then(clean_str)
}

/// Trimmed string, `None` when not a string or blank
fn clean_str(value: &Value) -> Option<String> {
    let trimmed = value.as_str()?.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Evidence quotes from a bare array or an object holding a `contexts` array
pub fn as_contexts(value: &Value) -> Vec<String> {
    let quotes = match value {
        Value::Array(quotes) => quotes,
        Value::Object(object) => match object.get("contexts") {
            Some(Value::Array(quotes)) => quotes,
            _ => return Vec::new(),
        },
        _ => return Vec::new(),
    };

    quotes
        .iter()
        .filter_map(clean_str)
        .take(MAX_CONTEXTS)
        .collect()
}

/// Canonicalize a timestamp
///
/// Strings must look like `H:MM`, `HH:MM` or `HH:MM:SS`, possibly after
/// stripping everything but digits and colons. Numbers are whole seconds.
///
/// # Examples
///
/// ```
/// use recap_extractor::clean_timestamp;
/// use serde_json::json;
///
/// assert_eq!(clean_timestamp(&json!(90)).as_deref(), Some("01:30"));
/// assert_eq!(clean_timestamp(&json!(3725)).as_deref(), Some("01:02:05"));
/// assert_eq!(clean_timestamp(&json!("[00:05:22]")).as_deref(), Some("00:05:22"));
/// assert_eq!(clean_timestamp(&json!("5:3")), None);
/// assert_eq!(clean_timestamp(&json!(-1)), None);
/// ```
pub fn clean_timestamp(value: &Value) -> Option<String> {
    match value {
        Value::Number(number) => {
            let secs = match number.as_u64() {
                Some(secs) => secs,
                None => {
                    let secs = number.as_f64()?.trunc();
                    if secs < 0.0 {
                        return None;
                    }
                    secs as u64
                }
            };
            Some(format_seconds(secs))
        }
        Value::String(text) => {
            let text = text.trim();
            if text.is_empty() {
                return None;
            }
            if TIMESTAMP.is_match(text) {
                return Some(text.to_string());
            }
            let stripped: String = text
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == ':')
                .collect();
            TIMESTAMP.is_match(&stripped).then_some(stripped)
        }
        _ => None,
    }
}

fn format_seconds(secs: u64) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}

/// Join details and subsidiary facts, then append the evidence block
fn compose_details(
    details: Option<String>,
    extras: &[String],
    contexts: &[String],
) -> Option<String> {
    let extras = (!extras.is_empty()).then(|| extras.join(" | "));
    let merged = [details, extras]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join("\n");

    if contexts.is_empty() {
        return (!merged.trim().is_empty()).then_some(merged);
    }

    let evidence = contexts
        .iter()
        .enumerate()
        .map(|(i, quote)| {
            if i == 0 {
                format!("Evidence: {}", quote)
            } else {
                format!("- {}", quote)
            }
        })
        .collect::<Vec<_>>()
        .join("\n");

    let merged = merged.trim();
    if merged.is_empty() {
        Some(evidence)
    } else {
        Some(format!("{}\n{}", merged, evidence))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_summary_string() {
        let normalized =
            normalize_entry(ItemCategory::Summary, &json!("  Budget approved ")).unwrap();
        assert_eq!(normalized.title, "Budget approved");
        assert!(normalized.details.is_none());
        assert!(normalized.contexts.is_empty());
    }

    #[test]
    fn test_summary_drops_blank_and_non_string() {
        assert!(normalize_entry(ItemCategory::Summary, &json!("   ")).is_none());
        assert!(normalize_entry(ItemCategory::Summary, &json!({"title": "x"})).is_none());
        assert!(normalize_entry(ItemCategory::Summary, &json!(7)).is_none());
    }

    #[test]
    fn test_missing_title_is_dropped() {
        for category in [
            ItemCategory::Decision,
            ItemCategory::ActionItem,
            ItemCategory::OpenQuestion,
            ItemCategory::Estimate,
            ItemCategory::Risk,
        ] {
            assert!(normalize_entry(category, &json!({"title": "  ", "owner": "Sam"})).is_none());
            assert!(normalize_entry(category, &json!({"details": "no title"})).is_none());
            assert!(normalize_entry(category, &json!("a bare string")).is_none());
        }
    }

    #[test]
    fn test_alternate_title_keys() {
        let entry = json!({"question": "Who owns QA?"});
        let q = normalize_entry(ItemCategory::OpenQuestion, &entry).unwrap();
        assert_eq!(q.title, "Who owns QA?");

        let entry = json!({"title": " ", "estimate": "3 days"});
        let e = normalize_entry(ItemCategory::Estimate, &entry).unwrap();
        assert_eq!(e.title, "3 days");

        let r = normalize_entry(ItemCategory::Risk, &json!({"risk": "Vendor delay"})).unwrap();
        assert_eq!(r.title, "Vendor delay");

        // decisions only read `title`
        assert!(normalize_entry(ItemCategory::Decision, &json!({"decision": "Ship"})).is_none());
    }

    #[test]
    fn test_decision_details_composition() {
        let entry = json!({
            "title": "Ship v2",
            "details": "After QA sign-off",
            "rationale": "Customers asked",
            "owner": "Priya",
            "due": "Friday",
            "contexts": ["00:05:22 Priya: let's ship v2", "  ", 4, "00:06:00 Alex: agreed"]
        });
        let normalized = normalize_entry(ItemCategory::Decision, &entry).unwrap();

        assert_eq!(
            normalized.details.as_deref(),
            Some(
                "After QA sign-off\nRationale: Customers asked | Owner: Priya | Due: Friday\n\
                 Evidence: 00:05:22 Priya: let's ship v2\n- 00:06:00 Alex: agreed"
            )
        );
        assert!(normalized.has_owner && normalized.has_due && normalized.has_rationale);
        assert_eq!(normalized.contexts.len(), 2);
    }

    #[test]
    fn test_questions_and_risks_ignore_details_key() {
        let entry = json!({
            "question": "Who signs off QA?",
            "details": "Raised twice, nobody volunteered",
            "speaker": "Priya",
            "timestamp_start": "00:05:22"
        });
        let question = normalize_entry(ItemCategory::OpenQuestion, &entry).unwrap();
        assert!(question.details.is_none());

        let entry = json!({"risk": "Vendor delay", "details": "Not in contract", "owner": "Lee"});
        let risk = normalize_entry(ItemCategory::Risk, &entry).unwrap();
        assert_eq!(risk.details.as_deref(), Some("Owner: Lee"));

        let entry = json!({"estimate": "3 days", "details": "Backend only"});
        let estimate = normalize_entry(ItemCategory::Estimate, &entry).unwrap();
        assert_eq!(estimate.details.as_deref(), Some("Backend only"));
    }

    #[test]
    fn test_action_item_assignee_renders_as_owner() {
        let entry = json!({"title": "Write migration", "assignee": "Sam", "due": " "});
        let normalized = normalize_entry(ItemCategory::ActionItem, &entry).unwrap();
        assert_eq!(normalized.details.as_deref(), Some("Owner: Sam"));
        assert!(normalized.has_owner);
        assert!(!normalized.has_due);
    }

    #[test]
    fn test_risk_extras_order() {
        let entry = json!({
            "title": "Vendor delay",
            "owner": "Lee",
            "mitigation": "Second supplier"
        });
        let normalized = normalize_entry(ItemCategory::Risk, &entry).unwrap();
        assert_eq!(
            normalized.details.as_deref(),
            Some("Mitigation: Second supplier | Owner: Lee")
        );
    }

    #[test]
    fn test_evidence_only_details() {
        let entry = json!({"title": "Ship v2", "contexts": ["quote"]});
        let normalized = normalize_entry(ItemCategory::Decision, &entry).unwrap();
        assert_eq!(normalized.details.as_deref(), Some("Evidence: quote"));
        assert!(!normalized.has_rationale);
    }

    #[test]
    fn test_no_details_is_absent() {
        let entry = json!({"title": "Ship v2", "details": "   ", "contexts": []});
        let normalized = normalize_entry(ItemCategory::Decision, &entry).unwrap();
        assert!(normalized.details.is_none());
    }

    #[test]
    fn test_contexts_truncated_in_order() {
        let quotes = json!(["a", "b", "c", "d", "e"]);
        assert_eq!(as_contexts(&quotes), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_contexts_from_nested_object() {
        let value = json!({"contexts": [" x ", null, "y"]});
        assert_eq!(as_contexts(&value), vec!["x", "y"]);
        assert!(as_contexts(&json!({"quotes": ["x"]})).is_empty());
        assert!(as_contexts(&json!("x")).is_empty());
    }

    #[test]
    fn test_timestamp_strings() {
        assert_eq!(clean_timestamp(&json!("00:05:22")).as_deref(), Some("00:05:22"));
        assert_eq!(clean_timestamp(&json!(" 5:03 ")).as_deref(), Some("5:03"));
        assert_eq!(clean_timestamp(&json!("at 12:30")).as_deref(), Some("12:30"));
        assert_eq!(clean_timestamp(&json!("5:3")), None);
        assert_eq!(clean_timestamp(&json!("later")), None);
        assert_eq!(clean_timestamp(&json!("")), None);
        assert_eq!(clean_timestamp(&json!("123:00")), None);
    }

    #[test]
    fn test_timestamp_numbers() {
        assert_eq!(clean_timestamp(&json!(0)).as_deref(), Some("00:00"));
        assert_eq!(clean_timestamp(&json!(90)).as_deref(), Some("01:30"));
        assert_eq!(clean_timestamp(&json!(90.9)).as_deref(), Some("01:30"));
        assert_eq!(clean_timestamp(&json!(3599)).as_deref(), Some("59:59"));
        assert_eq!(clean_timestamp(&json!(3600)).as_deref(), Some("01:00:00"));
        assert_eq!(clean_timestamp(&json!(-5)), None);
        assert_eq!(clean_timestamp(&json!(-0.5)).as_deref(), Some("00:00"));
    }

    #[test]
    fn test_timestamp_other_types() {
        assert_eq!(clean_timestamp(&json!(true)), None);
        assert_eq!(clean_timestamp(&json!(null)), None);
        assert_eq!(clean_timestamp(&json!(["00:10"])), None);
    }
}
