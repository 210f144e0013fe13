//! Ingest command implementation.

use crate::cli::IngestArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use recap_domain::traits::ExtractionStore;
use recap_domain::Transcript;
use recap_store::SqliteStore;
use std::fs;
use tracing::info;

/// Execute the ingest command.
pub fn execute_ingest(
    args: IngestArgs,
    store: &mut SqliteStore,
    formatter: &Formatter,
) -> Result<Transcript> {
    let raw_text = fs::read_to_string(&args.file)?;
    if raw_text.trim().is_empty() {
        return Err(CliError::InvalidInput(format!(
            "Transcript file '{}' is empty",
            args.file.display()
        )));
    }

    let transcript = Transcript::new(raw_text);
    store.create_transcript(transcript.clone())?;
    info!("Ingested {} as transcript {}", args.file.display(), transcript.id);

    println!("{}", formatter.format_transcript(&transcript)?);

    Ok(transcript)
}
