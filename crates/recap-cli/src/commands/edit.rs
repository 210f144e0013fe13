//! Edit command implementation.

use crate::cli::EditArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use recap_domain::traits::ExtractionStore;
use recap_domain::{apply_edit, ExtractedItem, ItemChanges};
use recap_store::SqliteStore;
use tracing::info;

/// Execute the edit command.
pub fn execute_edit(
    args: EditArgs,
    store: &mut SqliteStore,
    formatter: &Formatter,
) -> Result<ExtractedItem> {
    let mut item = store
        .get_item(args.item)?
        .ok_or_else(|| CliError::NotFound(format!("item {}", args.item)))?;

    let reason = args.reason.clone();
    let editor = args.editor.clone();
    let changes = parse_changes(args)?;

    let edit = apply_edit(&mut item, changes, reason, editor);
    info!("Recording edit {} on item {}", edit.id, item.id);
    store.record_edit(&item, edit)?;

    println!("{}", formatter.item_edited(&item)?);

    Ok(item)
}

/// Build the change set from either `--changes` JSON or the field flags.
fn parse_changes(args: EditArgs) -> Result<ItemChanges> {
    let changes = match args.changes {
        Some(json) => serde_json::from_str(&json)?,
        None => ItemChanges {
            title: args.title,
            details: args.details.map(clearable),
            speaker: args.speaker.map(clearable),
            timestamp_start: args.timestamp_start.map(clearable),
            timestamp_end: args.timestamp_end.map(clearable),
            status: args.status.map(Into::into),
            needs_review: args.needs_review,
            review_reasons: args.clear_reasons.then_some(None),
        },
    };

    if let Some(title) = &changes.title {
        if title.trim().is_empty() {
            return Err(CliError::InvalidInput("Title cannot be empty".to_string()));
        }
    }

    Ok(changes)
}

/// An empty flag value clears the field.
fn clearable(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
