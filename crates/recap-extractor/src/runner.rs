//! Extraction job runner
//!
//! Drives one job from `processing` to `ready` or `failed` in three phases:
//!
//! 1. load the job and its transcript under a short store lock
//! 2. call the model on the blocking pool, with no lock held, under a timeout
//! 3. repair, normalize, score and commit the outcome in one store transaction
//!
//! A per-job in-flight registry rejects a second concurrent run of the same
//! job in this process. The store's processing-only transition rejects it
//! across processes.

use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use crate::pipeline::{draft_items, materialize};
use crate::repair::repair;
use crate::scoring::ScoringPolicy;
use recap_domain::traits::{ExtractionStore, InferenceProvider};
use recap_domain::{
    apply_edit, ExtractedItem, ExtractionJob, ItemChanges, ItemEdit, ItemId, JobId, JobOutcome,
    JobStatus, Transcript, TranscriptId,
};
use recap_llm::resolve_model;
use std::collections::HashSet;
use std::fmt::Display;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

/// Error text of a job whose transcript no longer exists
pub const MISSING_TRANSCRIPT: &str = "Transcript version not found";

type Registry = Arc<Mutex<HashSet<JobId>>>;

/// Runs extraction jobs against a provider and a store
///
/// Cloning is cheap; clones share the provider, the store and the in-flight
/// registry.
pub struct ExtractionRunner<P, S> {
    provider: Arc<P>,
    store: Arc<Mutex<S>>,
    config: ExtractorConfig,
    policy: ScoringPolicy,
    in_flight: Registry,
}

impl<P, S> Clone for ExtractionRunner<P, S> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            store: Arc::clone(&self.store),
            config: self.config.clone(),
            policy: self.policy,
            in_flight: Arc::clone(&self.in_flight),
        }
    }
}

/// Marks a job as running until dropped
struct InFlightGuard {
    registry: Registry,
    job: JobId,
}

impl InFlightGuard {
    fn acquire(registry: &Registry, job: JobId) -> Result<Self, ExtractorError> {
        if !lock(registry).insert(job) {
            return Err(ExtractorError::JobInFlight(job));
        }
        Ok(Self {
            registry: Arc::clone(registry),
            job,
        })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        lock(&self.registry).remove(&self.job);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn store_error<E: Display>(e: E) -> ExtractorError {
    ExtractorError::Store(e.to_string())
}

/// First `max_chars` characters of `text`
pub(crate) fn clip(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn panic_detail(e: JoinError) -> String {
    if !e.is_panic() {
        return e.to_string();
    }
    let payload = e.into_panic();
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl<P, S> ExtractionRunner<P, S>
where
    P: InferenceProvider + Send + Sync + 'static,
    P::Error: Display,
    S: ExtractionStore + Send + 'static,
    S::Error: Display,
{
    /// Create a runner; fails if `config` is invalid
    pub fn new(provider: P, store: S, config: ExtractorConfig) -> Result<Self, ExtractorError> {
        config.validate().map_err(ExtractorError::Config)?;
        let policy = ScoringPolicy::new(config.auto_approve_threshold);

        Ok(Self {
            provider: Arc::new(provider),
            store: Arc::new(Mutex::new(store)),
            config,
            policy,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        })
    }

    /// Active configuration
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Store a new transcript version
    pub fn ingest(&self, raw_text: impl Into<String>) -> Result<Transcript, ExtractorError> {
        let transcript = Transcript::new(raw_text);
        lock(&self.store)
            .create_transcript(transcript.clone())
            .map_err(store_error)?;
        info!(
            "Stored transcript {} ({} chars)",
            transcript.id,
            transcript.raw_text.chars().count()
        );
        Ok(transcript)
    }

    /// Create a job in `processing` without starting it
    pub fn create_job(
        &self,
        transcript_id: TranscriptId,
        model: Option<String>,
    ) -> Result<ExtractionJob, ExtractorError> {
        let job = ExtractionJob::new(transcript_id, model);
        lock(&self.store)
            .create_job(job.clone())
            .map_err(store_error)?;
        info!("Created job {} for transcript {}", job.id, transcript_id);
        Ok(job)
    }

    /// Create a job and start it in the background
    ///
    /// Returns the job as created, still `processing`, together with the
    /// handle of the background task. Must be called inside a Tokio runtime.
    pub fn submit(
        &self,
        transcript_id: TranscriptId,
        model: Option<String>,
    ) -> Result<(ExtractionJob, JoinHandle<Result<ExtractionJob, ExtractorError>>), ExtractorError>
    {
        let job = self.create_job(transcript_id, model)?;
        let handle = self.start(job.id)?;
        Ok((job, handle))
    }

    /// Run a job in the background
    ///
    /// The handle may be dropped; the job still runs to completion. Fails
    /// immediately with [`ExtractorError::JobInFlight`] if the job is already
    /// running. Must be called inside a Tokio runtime.
    pub fn start(
        &self,
        job_id: JobId,
    ) -> Result<JoinHandle<Result<ExtractionJob, ExtractorError>>, ExtractorError> {
        let guard = InFlightGuard::acquire(&self.in_flight, job_id)?;
        let runner = self.clone();
        Ok(tokio::spawn(async move {
            let result = runner.run_guarded(job_id, guard).await;
            if let Err(e) = &result {
                error!("Job {} could not run: {}", job_id, e);
            }
            result
        }))
    }

    /// Run a job to its terminal state and return it
    pub async fn run(&self, job_id: JobId) -> Result<ExtractionJob, ExtractorError> {
        let guard = InFlightGuard::acquire(&self.in_flight, job_id)?;
        self.run_guarded(job_id, guard).await
    }

    async fn run_guarded(
        &self,
        job_id: JobId,
        _guard: InFlightGuard,
    ) -> Result<ExtractionJob, ExtractorError> {
        let (job, transcript) = self.load(job_id)?;

        let Some(transcript) = transcript else {
            warn!(
                "Job {} references missing transcript {}",
                job_id, job.transcript_id
            );
            return self.fail(job_id, MISSING_TRANSCRIPT.to_string());
        };

        let text = clip(&transcript.raw_text, self.config.max_transcript_chars).to_string();
        let model = resolve_model(job.model.as_deref(), self.config.default_model.as_deref());
        info!(
            "Running job {} ({} chars, model: {})",
            job_id,
            text.chars().count(),
            model.as_deref().unwrap_or("provider default")
        );

        let raw = match self.infer(text, model).await {
            Ok(raw) => raw,
            Err(detail) => return self.fail(job_id, format!("Extractor error: {}", detail)),
        };
        debug!("Model returned {} chars for job {}", raw.len(), job_id);

        self.commit(job_id, raw).await
    }

    fn load(&self, job_id: JobId) -> Result<(ExtractionJob, Option<Transcript>), ExtractorError> {
        let store = lock(&self.store);
        let job = store
            .get_job(job_id)
            .map_err(store_error)?
            .ok_or(ExtractorError::JobNotFound(job_id))?;

        if job.status.is_terminal() {
            return Err(ExtractorError::JobFinished {
                job: job_id,
                status: job.status,
            });
        }

        let transcript = store.get_transcript(job.transcript_id).map_err(store_error)?;
        Ok((job, transcript))
    }

    async fn infer(&self, text: String, model: Option<String>) -> Result<String, String> {
        let provider = Arc::clone(&self.provider);
        let call = tokio::task::spawn_blocking(move || {
            provider
                .infer(&text, model.as_deref())
                .map_err(|e| e.to_string())
        });

        match timeout(self.config.inference_timeout(), call).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(format!("inference task failed: {}", panic_detail(e))),
            Err(_) => Err(format!(
                "inference timed out after {}s",
                self.config.inference_timeout_secs
            )),
        }
    }

    async fn commit(&self, job_id: JobId, raw: String) -> Result<ExtractionJob, ExtractorError> {
        let store = Arc::clone(&self.store);
        let policy = self.policy;

        let task = tokio::task::spawn_blocking(move || -> Result<usize, String> {
            let repaired = repair(&raw);
            if repaired.degraded {
                warn!(
                    "Job {}: no JSON object in {} chars of model output, committing no items",
                    job_id,
                    raw.len()
                );
            }

            let raw_output = repaired.to_json().ok();
            let items = materialize(job_id, draft_items(&repaired, &policy));
            let count = items.len();

            lock(&store)
                .complete_job(
                    job_id,
                    JobOutcome::Ready {
                        raw_output,
                        parse_degraded: repaired.degraded,
                        items,
                    },
                )
                .map_err(|e| e.to_string())?;
            Ok(count)
        });

        match task.await {
            Ok(Ok(count)) => {
                info!("Job {} ready with {} items", job_id, count);
                self.job(job_id)
            }
            Ok(Err(detail)) => self.fail(job_id, format!("Materialization error: {}", detail)),
            Err(e) => self.fail(job_id, format!("Materialization panicked: {}", panic_detail(e))),
        }
    }

    fn fail(&self, job_id: JobId, error: String) -> Result<ExtractionJob, ExtractorError> {
        error!("Job {} failed: {}", job_id, error);
        let mut store = lock(&self.store);
        store
            .complete_job(job_id, JobOutcome::Failed { error })
            .map_err(store_error)?;
        store
            .get_job(job_id)
            .map_err(store_error)?
            .ok_or(ExtractorError::JobNotFound(job_id))
    }

    /// Current state of a job
    pub fn job(&self, job_id: JobId) -> Result<ExtractionJob, ExtractorError> {
        lock(&self.store)
            .get_job(job_id)
            .map_err(store_error)?
            .ok_or(ExtractorError::JobNotFound(job_id))
    }

    /// Lifecycle state of a job
    pub fn status(&self, job_id: JobId) -> Result<JobStatus, ExtractorError> {
        Ok(self.job(job_id)?.status)
    }

    /// Items of a job in materialization order
    ///
    /// Empty until the job is `ready`; a failed job never has items.
    pub fn items(&self, job_id: JobId) -> Result<Vec<ExtractedItem>, ExtractorError> {
        let store = lock(&self.store);
        if store.get_job(job_id).map_err(store_error)?.is_none() {
            return Err(ExtractorError::JobNotFound(job_id));
        }
        store.list_items(job_id).map_err(store_error)
    }

    /// Apply a human correction and record it in the item's history
    pub fn edit(
        &self,
        item_id: ItemId,
        changes: ItemChanges,
        reason: Option<String>,
        editor: Option<String>,
    ) -> Result<ExtractedItem, ExtractorError> {
        let mut store = lock(&self.store);
        let mut item = store
            .get_item(item_id)
            .map_err(store_error)?
            .ok_or(ExtractorError::ItemNotFound(item_id))?;

        let edit = apply_edit(&mut item, changes, reason, editor);
        info!(
            "Editing item {} (editor: {})",
            item_id,
            edit.editor.as_deref().unwrap_or("unknown")
        );
        store.record_edit(&item, edit).map_err(store_error)?;
        Ok(item)
    }

    /// Edits of an item, oldest first
    pub fn history(&self, item_id: ItemId) -> Result<Vec<ItemEdit>, ExtractorError> {
        let store = lock(&self.store);
        if store.get_item(item_id).map_err(store_error)?.is_none() {
            return Err(ExtractorError::ItemNotFound(item_id));
        }
        store.list_edits(item_id).map_err(store_error)
    }
}
