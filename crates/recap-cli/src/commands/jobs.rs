//! Jobs command implementation.

use crate::cli::JobsArgs;
use crate::error::Result;
use crate::output::Formatter;
use recap_domain::ExtractionJob;
use recap_store::SqliteStore;

/// Execute the jobs command.
///
/// Jobs are not tied to a stored transcript, so an unknown transcript lists
/// nothing rather than failing.
pub fn execute_jobs(
    args: JobsArgs,
    store: &SqliteStore,
    formatter: &Formatter,
) -> Result<Vec<ExtractionJob>> {
    let jobs = store.list_jobs_for_transcript(args.transcript)?;
    println!("{}", formatter.format_jobs(&jobs)?);

    Ok(jobs)
}
