//! History command implementation.

use crate::cli::HistoryArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use recap_domain::traits::ExtractionStore;
use recap_domain::ItemEdit;
use recap_store::SqliteStore;

/// Execute the history command.
pub fn execute_history(
    args: HistoryArgs,
    store: &SqliteStore,
    formatter: &Formatter,
) -> Result<Vec<ItemEdit>> {
    if store.get_item(args.item)?.is_none() {
        return Err(CliError::NotFound(format!("item {}", args.item)));
    }

    let edits = store.list_edits(args.item)?;
    println!("{}", formatter.format_history(&edits)?);

    Ok(edits)
}
