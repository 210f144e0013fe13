//! Recover a JSON object from free-form model output
//!
//! Models wrap their answer in code fences, add commentary before or after
//! it, or stop mid-object. Repair tries, in order: the whole text, then the
//! span from the first opening bracket to the last matching closing bracket.
//! Anything that still does not yield an object degrades to an empty mapping
//! and is reported through [`RepairedResponse::degraded`].

use recap_domain::ItemCategory;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^```(?:json)?\s*|\s*```$").expect("code fence pattern is valid")
});

/// Mapping recovered from a model response
#[derive(Debug, Clone, PartialEq)]
pub struct RepairedResponse {
    /// Top-level object, with every category key present as an array
    pub fields: Map<String, Value>,

    /// True when no object could be recovered and `fields` holds only defaults
    pub degraded: bool,
}

impl RepairedResponse {
    /// Entries listed under a category
    pub fn entries(&self, category: ItemCategory) -> &[Value] {
        self.fields
            .get(category.source_key())
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Serialize the repaired mapping for audit storage
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.fields)
    }
}

/// Recover a JSON object from `raw`
///
/// # Examples
///
/// ```
/// use recap_extractor::repair;
///
/// let repaired = repair("Sure! ```json\n{\"summary\": [\"Kickoff\"]}\n```");
/// assert!(!repaired.degraded);
/// assert_eq!(repaired.fields["summary"][0], "Kickoff");
/// assert_eq!(repaired.fields["risks"], serde_json::json!([]));
/// ```
pub fn repair(raw: &str) -> RepairedResponse {
    let recovered = recover_object(raw);
    let degraded = recovered.is_none();
    let mut fields = recovered.unwrap_or_default();

    for category in ItemCategory::ALL {
        let key = category.source_key();
        if !fields.get(key).is_some_and(Value::is_array) {
            fields.insert(key.to_string(), Value::Array(Vec::new()));
        }
    }

    RepairedResponse { fields, degraded }
}

fn recover_object(raw: &str) -> Option<Map<String, Value>> {
    if raw.trim().is_empty() {
        return None;
    }

    let text = strip_code_fences(raw);

    if let Some(object) = parse_object(&text) {
        return Some(object);
    }

    json_fragment(&text).and_then(parse_object)
}

fn strip_code_fences(text: &str) -> String {
    CODE_FENCE.replace_all(text, "").trim().to_string()
}

fn parse_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(object)) => Some(object),
        _ => None,
    }
}

/// Span from the first `{` or `[` to the last closer of the same kind
fn json_fragment(text: &str) -> Option<&str> {
    let start = text.find(['{', '['])?;
    let closer = if text[start..].starts_with('{') { '}' } else { ']' };
    let end = text.rfind(closer)?;

    if end <= start {
        return None;
    }
    Some(&text[start..=end])
}
