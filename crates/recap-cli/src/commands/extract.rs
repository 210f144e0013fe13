//! Extract command implementation.

use crate::cli::{ExtractArgs, PolicyArg};
use crate::error::Result;
use crate::output::Formatter;
use recap_domain::{ExtractionJob, JobStatus};
use recap_extractor::{ExtractionRunner, ExtractorConfig, ExtractorError};
use recap_llm::ReplayProvider;
use recap_store::SqliteStore;

/// Execute the extract command.
///
/// Runs the job to completion against the recorded response and prints the
/// terminal job. A job that ends `failed` is still a successful command.
pub async fn execute_extract(
    args: ExtractArgs,
    store: SqliteStore,
    config: &ExtractorConfig,
    formatter: &Formatter,
) -> Result<ExtractionJob> {
    let config = with_policy(config, args.policy);
    let provider = ReplayProvider::new(args.response);
    let runner = ExtractionRunner::new(provider, store, config)?;

    let (job, handle) = runner.submit(args.transcript, args.model)?;
    eprintln!("{}", formatter.info(&format!("Job {} submitted", job.id)));

    let finished = handle.await.map_err(ExtractorError::from)??;
    let items = runner.items(finished.id)?;

    if finished.status == JobStatus::Failed {
        eprintln!("{}", formatter.error("Extraction failed"));
    } else if finished.parse_degraded {
        eprintln!("{}", formatter.warning("Model output could not be parsed"));
    }
    println!("{}", formatter.format_job(&finished, items.len())?);

    Ok(finished)
}

/// The configured settings with the preset's threshold, if one was chosen
fn with_policy(config: &ExtractorConfig, policy: Option<PolicyArg>) -> ExtractorConfig {
    let preset = match policy {
        Some(PolicyArg::Strict) => ExtractorConfig::strict(),
        Some(PolicyArg::Permissive) => ExtractorConfig::permissive(),
        None => return config.clone(),
    };
    ExtractorConfig {
        auto_approve_threshold: preset.auto_approve_threshold,
        ..config.clone()
    }
}
