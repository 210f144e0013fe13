//! Runner tests against a real SQLite store

#[cfg(test)]
mod tests {
    use crate::{ExtractionRunner, ExtractorConfig, ExtractorError, MISSING_TRANSCRIPT};
    use recap_domain::traits::ExtractionStore;
    use recap_domain::{
        ExtractedItem, ExtractionJob, ItemCategory, ItemChanges, ItemEdit, ItemId, ItemStatus,
        JobId, JobOutcome, JobStatus, Transcript, TranscriptId,
    };
    use recap_llm::MockProvider;
    use recap_store::{SqliteStore, StoreError};
    use std::time::Duration;

    const TRANSCRIPT: &str =
        "00:05:22 Priya: let's ship v2 on Friday\n00:06:10 Sam: I'll write the migration";

    const RESPONSE: &str = r#"Here you go:
```json
{
  "summary": ["Team agreed to ship v2", ""],
  "decisions": [{"title": "Ship v2", "rationale": null, "owner": null, "due": null,
                 "speaker": null, "timestamp_start": null, "contexts": []}],
  "action_items": [{"title": "Write migration", "details": "Schema change for v2",
                    "assignee": "Sam", "due": "Thursday", "speaker": "Sam",
                    "timestamp_start": "00:06:10",
                    "contexts": ["00:06:10 Sam: I'll write the migration"]}],
  "open_questions": [{"question": "Who signs off QA?"}],
  "estimates": [{"title": "Migration takes 2 days", "speaker": "Sam"}]
}
```"#;

    fn runner(provider: MockProvider) -> ExtractionRunner<MockProvider, SqliteStore> {
        runner_with(provider, ExtractorConfig::default())
    }

    fn runner_with(
        provider: MockProvider,
        config: ExtractorConfig,
    ) -> ExtractionRunner<MockProvider, SqliteStore> {
        let store = SqliteStore::new(":memory:").unwrap();
        ExtractionRunner::new(provider, store, config).unwrap()
    }

    #[tokio::test]
    async fn test_full_extraction_flow() {
        let runner = runner(MockProvider::new(RESPONSE));
        let transcript = runner.ingest(TRANSCRIPT).unwrap();

        let (job, handle) = runner.submit(transcript.id, None).unwrap();
        assert_eq!(job.status, JobStatus::Processing);

        let finished = handle.await.unwrap().unwrap();
        assert_eq!(finished.status, JobStatus::Ready);
        assert!(!finished.parse_degraded);
        assert!(finished.error.is_none());
        assert!(finished.completed_at.is_some());

        let raw_output: serde_json::Value =
            serde_json::from_str(finished.raw_output.as_deref().unwrap()).unwrap();
        assert_eq!(raw_output["risks"], serde_json::json!([]));

        let items = runner.items(job.id).unwrap();
        let categories: Vec<ItemCategory> = items.iter().map(|i| i.category).collect();
        assert_eq!(
            categories,
            vec![
                ItemCategory::Summary,
                ItemCategory::Decision,
                ItemCategory::ActionItem,
                ItemCategory::OpenQuestion,
                ItemCategory::Estimate,
            ]
        );

        let decision = &items[1];
        assert!((decision.confidence - 0.54).abs() < 1e-9);
        assert_eq!(decision.status, ItemStatus::Pending);

        let action = &items[2];
        assert!((action.confidence - 0.90).abs() < 1e-9);
        assert_eq!(action.status, ItemStatus::Approved);
        assert!(!action.needs_review);
        assert!(action.review_reasons.is_none());
        assert_eq!(
            action.details.as_deref(),
            Some(concat!(
                "Schema change for v2\nOwner: Sam | Due: Thursday\n",
                "Evidence: 00:06:10 Sam: I'll write the migration"
            ))
        );

        assert_eq!(runner.status(job.id).unwrap(), JobStatus::Ready);
    }

    #[tokio::test]
    async fn test_missing_transcript_fails_without_model_call() {
        let provider = MockProvider::new(RESPONSE);
        let runner = runner(provider.clone());

        let job = runner.create_job(TranscriptId::new(), None).unwrap();
        let finished = runner.run(job.id).await.unwrap();

        assert_eq!(finished.status, JobStatus::Failed);
        assert_eq!(finished.error.as_deref(), Some(MISSING_TRANSCRIPT));
        assert_eq!(provider.call_count(), 0);
        assert!(runner.items(job.id).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upstream_failure_embeds_detail() {
        let mut provider = MockProvider::new(RESPONSE);
        provider.add_error(TRANSCRIPT, "quota exhausted");
        let runner = runner(provider);

        let transcript = runner.ingest(TRANSCRIPT).unwrap();
        let job = runner.create_job(transcript.id, None).unwrap();
        let finished = runner.run(job.id).await.unwrap();

        assert_eq!(finished.status, JobStatus::Failed);
        let error = finished.error.unwrap();
        assert_eq!(error, "Extractor error: LLM error: quota exhausted");
        assert!(finished.raw_output.is_none());
        assert!(runner.items(job.id).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unparseable_output_is_ready_but_degraded() {
        let runner = runner(MockProvider::new("Sorry, I can't help with that."));
        let transcript = runner.ingest(TRANSCRIPT).unwrap();
        let job = runner.create_job(transcript.id, None).unwrap();

        let finished = runner.run(job.id).await.unwrap();
        assert_eq!(finished.status, JobStatus::Ready);
        assert!(finished.parse_degraded);
        assert!(runner.items(job.id).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_object_is_ready_not_degraded() {
        let runner = runner(MockProvider::new("{}"));
        let transcript = runner.ingest(TRANSCRIPT).unwrap();
        let job = runner.create_job(transcript.id, None).unwrap();

        let finished = runner.run(job.id).await.unwrap();
        assert_eq!(finished.status, JobStatus::Ready);
        assert!(!finished.parse_degraded);
    }

    #[tokio::test]
    async fn test_transcript_is_clipped() {
        let provider = MockProvider::new("{}");
        let mut config = ExtractorConfig::default();
        config.max_transcript_chars = 10;
        let runner = runner_with(provider.clone(), config);

        let transcript = runner.ingest("é".repeat(50)).unwrap();
        let job = runner.create_job(transcript.id, None).unwrap();
        runner.run(job.id).await.unwrap();

        let calls = provider.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].transcript, "é".repeat(10));
    }

    #[tokio::test]
    async fn test_model_resolution() {
        let provider = MockProvider::new("{}");
        let mut config = ExtractorConfig::default();
        config.default_model = Some("base".to_string());
        let runner = runner_with(provider.clone(), config);
        let transcript = runner.ingest(TRANSCRIPT).unwrap();

        for requested in [None, Some("default"), Some("  "), Some("large-v3")] {
            let job = runner
                .create_job(transcript.id, requested.map(str::to_string))
                .unwrap();
            runner.run(job.id).await.unwrap();
        }

        let models: Vec<Option<String>> = provider.calls().into_iter().map(|c| c.model).collect();
        assert_eq!(
            models,
            vec![
                Some("base".to_string()),
                Some("base".to_string()),
                Some("base".to_string()),
                Some("large-v3".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_inference_timeout_fails_job() {
        let provider = MockProvider::new("{}").with_latency(Duration::from_millis(1500));
        let mut config = ExtractorConfig::default();
        config.inference_timeout_secs = 1;
        let runner = runner_with(provider, config);

        let transcript = runner.ingest(TRANSCRIPT).unwrap();
        let job = runner.create_job(transcript.id, None).unwrap();
        let finished = runner.run(job.id).await.unwrap();

        assert_eq!(finished.status, JobStatus::Failed);
        let error = finished.error.unwrap();
        assert!(error.starts_with("Extractor error: "));
        assert!(error.contains("timed out"));
    }

    #[tokio::test]
    async fn test_concurrent_start_is_rejected() {
        let provider = MockProvider::new(RESPONSE).with_latency(Duration::from_millis(300));
        let runner = runner(provider.clone());

        let transcript = runner.ingest(TRANSCRIPT).unwrap();
        let job = runner.create_job(transcript.id, None).unwrap();

        let first = runner.start(job.id).unwrap();
        match runner.start(job.id) {
            Err(ExtractorError::JobInFlight(id)) => assert_eq!(id, job.id),
            other => panic!("Expected JobInFlight, got {:?}", other.map(|_| ())),
        }
        assert!(matches!(
            runner.run(job.id).await,
            Err(ExtractorError::JobInFlight(_))
        ));

        let finished = first.await.unwrap().unwrap();
        assert_eq!(finished.status, JobStatus::Ready);
        assert_eq!(runner.items(job.id).unwrap().len(), 5);
        assert_eq!(provider.call_count(), 1);

        // Terminal jobs do not run again
        match runner.run(job.id).await {
            Err(ExtractorError::JobFinished { status, .. }) => assert_eq!(status, JobStatus::Ready),
            other => panic!("Expected JobFinished, got {:?}", other),
        }
        assert_eq!(runner.items(job.id).unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_unknown_job() {
        let runner = runner(MockProvider::default());
        let id = JobId::new();
        assert!(matches!(runner.run(id).await, Err(ExtractorError::JobNotFound(_))));
        assert!(matches!(runner.items(id), Err(ExtractorError::JobNotFound(_))));
        assert!(matches!(runner.status(id), Err(ExtractorError::JobNotFound(_))));
    }

    #[tokio::test]
    async fn test_permissive_threshold_approves_summary() {
        let runner = runner_with(
            MockProvider::new(r#"{"summary": ["Kickoff"]}"#),
            ExtractorConfig::permissive(),
        );
        let transcript = runner.ingest(TRANSCRIPT).unwrap();
        let job = runner.create_job(transcript.id, None).unwrap();
        runner.run(job.id).await.unwrap();

        let items = runner.items(job.id).unwrap();
        assert_eq!(items[0].status, ItemStatus::Approved);
        assert!(!items[0].needs_review);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = ExtractorConfig::default();
        config.auto_approve_threshold = 2.0;
        let store = SqliteStore::new(":memory:").unwrap();
        let result = ExtractionRunner::new(MockProvider::default(), store, config);
        assert!(matches!(result, Err(ExtractorError::Config(_))));
    }

    #[tokio::test]
    async fn test_edit_and_history() {
        let runner = runner(MockProvider::new(RESPONSE));
        let transcript = runner.ingest(TRANSCRIPT).unwrap();
        let job = runner.create_job(transcript.id, None).unwrap();
        runner.run(job.id).await.unwrap();

        let decision = runner.items(job.id).unwrap().remove(1);
        let changes: ItemChanges =
            serde_json::from_str(r#"{"status": "approved", "speaker": "Priya"}"#).unwrap();
        let edited = runner
            .edit(
                decision.id,
                changes,
                Some("confirmed in notes".to_string()),
                Some("lee".to_string()),
            )
            .unwrap();

        assert_eq!(edited.status, ItemStatus::Approved);
        assert_eq!(edited.speaker.as_deref(), Some("Priya"));
        assert_eq!(edited.confidence, decision.confidence);
        assert!(edited.needs_review);

        let history = runner.history(decision.id).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].prev.status, ItemStatus::Pending);
        assert_eq!(history[0].next.status, ItemStatus::Approved);
        assert_eq!(history[0].next.title, decision.title);
        assert_eq!(history[0].editor.as_deref(), Some("lee"));

        assert!(matches!(
            runner.edit(ItemId::new(), ItemChanges::default(), None, None),
            Err(ExtractorError::ItemNotFound(_))
        ));
        assert!(matches!(
            runner.history(ItemId::new()),
            Err(ExtractorError::ItemNotFound(_))
        ));
    }

    /// How a [`FaultyStore`] misbehaves when asked to commit a ready job
    #[derive(Clone, Copy)]
    enum Fault {
        Panic,
        Reject,
    }

    struct FaultyStore {
        inner: SqliteStore,
        fault: Fault,
    }

    impl ExtractionStore for FaultyStore {
        type Error = StoreError;

        fn create_transcript(
            &mut self,
            transcript: Transcript,
        ) -> Result<TranscriptId, StoreError> {
            self.inner.create_transcript(transcript)
        }

        fn get_transcript(&self, id: TranscriptId) -> Result<Option<Transcript>, StoreError> {
            self.inner.get_transcript(id)
        }

        fn create_job(&mut self, job: ExtractionJob) -> Result<JobId, StoreError> {
            self.inner.create_job(job)
        }

        fn get_job(&self, id: JobId) -> Result<Option<ExtractionJob>, StoreError> {
            self.inner.get_job(id)
        }

        fn complete_job(&mut self, id: JobId, outcome: JobOutcome) -> Result<(), StoreError> {
            if let JobOutcome::Ready { .. } = outcome {
                match self.fault {
                    Fault::Panic => panic!("disk on fire"),
                    Fault::Reject => {
                        return Err(StoreError::InvalidData("simulated write failure".to_string()))
                    }
                }
            }
            self.inner.complete_job(id, outcome)
        }

        fn list_items(&self, job: JobId) -> Result<Vec<ExtractedItem>, StoreError> {
            self.inner.list_items(job)
        }

        fn get_item(&self, id: ItemId) -> Result<Option<ExtractedItem>, StoreError> {
            self.inner.get_item(id)
        }

        fn record_edit(&mut self, item: &ExtractedItem, edit: ItemEdit) -> Result<(), StoreError> {
            self.inner.record_edit(item, edit)
        }

        fn list_edits(&self, item: ItemId) -> Result<Vec<ItemEdit>, StoreError> {
            self.inner.list_edits(item)
        }
    }

    async fn run_with_fault(fault: Fault) -> (ExtractionJob, Vec<ExtractedItem>) {
        let store = FaultyStore {
            inner: SqliteStore::new(":memory:").unwrap(),
            fault,
        };
        let runner =
            ExtractionRunner::new(MockProvider::new(RESPONSE), store, ExtractorConfig::default())
                .unwrap();
        let transcript = runner.ingest(TRANSCRIPT).unwrap();
        let job = runner.create_job(transcript.id, None).unwrap();
        let finished = runner.run(job.id).await.unwrap();
        let items = runner.items(job.id).unwrap();
        (finished, items)
    }

    #[tokio::test]
    async fn test_panic_during_materialization_fails_job() {
        let (finished, items) = run_with_fault(Fault::Panic).await;
        assert_eq!(finished.status, JobStatus::Failed);
        let error = finished.error.unwrap();
        assert!(error.contains("disk on fire"), "{}", error);
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_commit_error_fails_job_with_detail() {
        let (finished, items) = run_with_fault(Fault::Reject).await;
        assert_eq!(finished.status, JobStatus::Failed);
        assert_eq!(
            finished.error.as_deref(),
            Some("Materialization error: Invalid data: simulated write failure")
        );
        assert!(items.is_empty());
    }
}
