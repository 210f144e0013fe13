//! Status command implementation.

use crate::cli::StatusArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use recap_domain::traits::ExtractionStore;
use recap_domain::ExtractionJob;
use recap_store::SqliteStore;

/// Execute the status command.
pub fn execute_status(
    args: StatusArgs,
    store: &SqliteStore,
    formatter: &Formatter,
) -> Result<ExtractionJob> {
    let job = store
        .get_job(args.job)?
        .ok_or_else(|| CliError::NotFound(format!("job {}", args.job)))?;
    let item_count = store.count_items(job.id)?;

    println!("{}", formatter.format_job(&job, item_count)?);

    Ok(job)
}
