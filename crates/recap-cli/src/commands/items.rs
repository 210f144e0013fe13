//! Items command implementation.

use crate::cli::ItemsArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use recap_domain::traits::ExtractionStore;
use recap_domain::{ExtractedItem, ItemCategory};
use recap_store::SqliteStore;

/// Execute the items command.
pub fn execute_items(
    args: ItemsArgs,
    store: &SqliteStore,
    formatter: &Formatter,
) -> Result<Vec<ExtractedItem>> {
    if store.get_job(args.job)?.is_none() {
        return Err(CliError::NotFound(format!("job {}", args.job)));
    }

    let category = args.category.map(ItemCategory::from);
    let items: Vec<ExtractedItem> = store
        .list_items(args.job)?
        .into_iter()
        .filter(|item| category.map_or(true, |c| item.category == c))
        .filter(|item| !args.needs_review || item.needs_review)
        .collect();

    println!("{}", formatter.format_items(&items)?);

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::CategoryArg;
    use crate::config::OutputFormat;
    use recap_domain::{ExtractionJob, ItemId, ItemStatus, JobId, JobOutcome, Transcript};

    fn item(job: JobId, category: ItemCategory, needs_review: bool) -> ExtractedItem {
        ExtractedItem {
            id: ItemId::new(),
            job_id: job,
            category,
            title: format!("{} item", category.as_str()),
            details: None,
            speaker: None,
            timestamp_start: None,
            timestamp_end: None,
            confidence: if needs_review { 0.5 } else { 0.9 },
            field_confidence: Default::default(),
            needs_review,
            review_reasons: None,
            status: if needs_review { ItemStatus::Pending } else { ItemStatus::Approved },
            created_at: 0,
        }
    }

    fn seeded_store() -> (SqliteStore, JobId) {
        let mut store = SqliteStore::new(":memory:").unwrap();
        let transcript = Transcript::new("text");
        store.create_transcript(transcript.clone()).unwrap();
        let job = ExtractionJob::new(transcript.id, None);
        store.create_job(job.clone()).unwrap();

        let items = vec![
            item(job.id, ItemCategory::Summary, true),
            item(job.id, ItemCategory::Decision, false),
            item(job.id, ItemCategory::Decision, true),
        ];
        store
            .complete_job(
                job.id,
                JobOutcome::Ready {
                    raw_output: Some("{}".to_string()),
                    parse_degraded: false,
                    items,
                },
            )
            .unwrap();
        (store, job.id)
    }

    #[test]
    fn test_filters_combine() {
        let (store, job) = seeded_store();
        let formatter = Formatter::new(OutputFormat::Quiet, false);

        let all = execute_items(
            ItemsArgs { job, category: None, needs_review: false },
            &store,
            &formatter,
        )
        .unwrap();
        assert_eq!(all.len(), 3);

        let decisions = execute_items(
            ItemsArgs { job, category: Some(CategoryArg::Decision), needs_review: false },
            &store,
            &formatter,
        )
        .unwrap();
        assert_eq!(decisions.len(), 2);

        let flagged = execute_items(
            ItemsArgs { job, category: Some(CategoryArg::Decision), needs_review: true },
            &store,
            &formatter,
        )
        .unwrap();
        assert_eq!(flagged.len(), 1);
        assert!(flagged[0].needs_review);
    }

    #[test]
    fn test_unknown_job() {
        let store = SqliteStore::new(":memory:").unwrap();
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        let result = execute_items(
            ItemsArgs { job: JobId::new(), category: None, needs_review: false },
            &store,
            &formatter,
        );
        assert!(matches!(result, Err(CliError::NotFound(_))));
    }
}
