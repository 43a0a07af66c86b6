//! Lifecycle owner for transcription jobs.
//!
//! Every job gets one driver task that races two clocks: a fast progress
//! ticker capped below 100 and the backend call, whose resolution is the only
//! terminal signal. All mutations and their fan-out to subscribers happen
//! under the registry mutex, so a cancelled driver can never publish after
//! the terminal snapshot.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tokio::time::{Instant, MissedTickBehavior};
use uuid::Uuid;

use crate::models::job::{Job, JobError, JobKind, JobState, SourceFile};
use crate::services::backend::{SimulatedBackend, TranscriptionBackend};
use crate::services::progress::ProgressSettings;
use crate::services::subscription::{Subscription, UpdateHandle};

/// Largest upload accepted by default (10 MiB).
pub const DEFAULT_MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    pub progress: ProgressSettings,
    pub max_file_bytes: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            progress: ProgressSettings::default(),
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
        }
    }
}

/// Result of a cancel request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    Cancelled,
    /// The job had already finished; nothing changed.
    AlreadyTerminal(JobState),
}

/// Filter for [`TranscriptionEngine::list`].
#[derive(Debug, Default, Clone)]
pub struct JobFilter {
    pub kind: Option<JobKind>,
    pub search: Option<String>,
}

impl JobFilter {
    pub fn matches(&self, job: &Job) -> bool {
        if self.kind.is_some_and(|kind| kind != job.kind) {
            return false;
        }
        let Some(needle) = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        else {
            return true;
        };
        let needle = needle.to_lowercase();
        job.source.name.to_lowercase().contains(&needle)
            || job
                .result
                .as_deref()
                .is_some_and(|text| text.to_lowercase().contains(&needle))
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct EngineStats {
    pub total_jobs: usize,
    pub active_jobs: usize,
}

struct JobEntry {
    job: Job,
    subscribers: Vec<(u64, mpsc::UnboundedSender<Job>)>,
    driver: Option<AbortHandle>,
}

impl JobEntry {
    fn new(job: Job) -> Self {
        Self {
            job,
            subscribers: Vec::new(),
            driver: None,
        }
    }

    /// Deliver the current snapshot to every subscriber. Terminal snapshots close all streams.
    fn publish(&mut self) {
        let job = &self.job;
        self.subscribers.retain(|(_, tx)| tx.send(job.clone()).is_ok());
        if job.state.is_terminal() {
            self.subscribers.clear();
            self.driver = None;
        }
    }
}

#[derive(Default)]
struct RegistryInner {
    jobs: HashMap<Uuid, JobEntry>,
    next_subscriber: u64,
}

/// Job map shared between the engine, its driver tasks and live subscriptions.
#[derive(Default)]
pub(crate) struct Registry {
    inner: Mutex<RegistryInner>,
}

impl Registry {
    fn lock(&self) -> MutexGuard<'_, RegistryInner> {
        self.inner.lock().unwrap_or_else(|poisoned| {
            tracing::error!("Job registry mutex poisoned, recovering");
            poisoned.into_inner()
        })
    }

    pub(crate) fn remove_subscriber(&self, job_id: Uuid, subscriber: u64) {
        if let Some(entry) = self.lock().jobs.get_mut(&job_id) {
            entry.subscribers.retain(|(id, _)| *id != subscriber);
        }
    }
}

enum Transition {
    Applied(Job),
    Unchanged,
    /// Job is terminal or gone; the driver must stop.
    Closed,
}

/// Owns every transcription job from submission to its terminal state.
///
/// Cheap to clone. Must be used from within a tokio runtime.
#[derive(Clone)]
pub struct TranscriptionEngine {
    registry: Arc<Registry>,
    backend: Arc<dyn TranscriptionBackend>,
    settings: EngineSettings,
}

impl TranscriptionEngine {
    pub fn new(settings: EngineSettings, backend: Arc<dyn TranscriptionBackend>) -> Self {
        Self {
            registry: Arc::new(Registry::default()),
            backend,
            settings,
        }
    }

    pub fn simulated(settings: EngineSettings, backend: SimulatedBackend) -> Self {
        Self::new(settings, Arc::new(backend))
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Check a file against a job kind without creating anything.
    pub fn validate(&self, file: &SourceFile, kind: JobKind) -> Result<(), EngineError> {
        if !kind.accepts(&file.media_type) {
            return Err(EngineError::InvalidInputKind {
                expected: kind,
                media_type: file.media_type.clone(),
            });
        }
        if file.size == 0 {
            return Err(EngineError::EmptyFile);
        }
        if file.size > self.settings.max_file_bytes {
            return Err(EngineError::FileTooLarge {
                size: file.size,
                limit: self.settings.max_file_bytes,
            });
        }
        Ok(())
    }

    /// Validate `file` and start a job for it.
    ///
    /// Returns the job in [`JobState::Validating`]; its driver moves it to
    /// running on the next scheduler turn. Rejected files never create a job.
    pub fn submit(&self, file: SourceFile, kind: JobKind) -> Result<Job, EngineError> {
        if let Err(e) = self.validate(&file, kind) {
            tracing::warn!(
                kind = %kind,
                file = %file.name,
                media_type = %file.media_type,
                size = file.size,
                error = %e,
                "Rejected transcription upload"
            );
            metrics::counter!("transcription_jobs_rejected", "kind" => kind.to_string())
                .increment(1);
            return Err(e);
        }

        let job = Job::new(kind, file);
        let job_id = job.id;
        self.registry
            .lock()
            .jobs
            .insert(job_id, JobEntry::new(job.clone()));

        let driver = tokio::spawn(self.clone().drive(job_id)).abort_handle();
        if let Some(entry) = self.registry.lock().jobs.get_mut(&job_id) {
            if entry.job.state.is_active() {
                entry.driver = Some(driver);
            }
        }

        metrics::counter!("transcription_jobs_submitted", "kind" => kind.to_string()).increment(1);
        metrics::gauge!("transcription_active_jobs").increment(1.0);
        tracing::info!(
            job_id = %job_id,
            kind = %kind,
            file = %job.source.name,
            size = job.source.size,
            "Transcription job submitted"
        );

        Ok(job)
    }

    /// Stream every update for a job, starting after the snapshot in
    /// [`Subscription::initial`]. A finished job yields a closed stream.
    pub fn subscribe(&self, job_id: Uuid) -> Result<Subscription, EngineError> {
        let mut registry = self.registry.lock();
        let subscriber = registry.next_subscriber;
        registry.next_subscriber += 1;

        let entry = registry
            .jobs
            .get_mut(&job_id)
            .ok_or(EngineError::JobNotFound(job_id))?;

        let (tx, rx) = mpsc::unbounded_channel();
        if entry.job.state.is_active() {
            entry.subscribers.push((subscriber, tx));
        }
        let initial = entry.job.clone();
        drop(registry);

        Ok(Subscription::new(
            subscriber,
            initial,
            rx,
            Arc::downgrade(&self.registry),
        ))
    }

    /// Invoke `on_update` for every update of a job, in order.
    pub fn on_update<F>(&self, job_id: Uuid, mut on_update: F) -> Result<UpdateHandle, EngineError>
    where
        F: FnMut(Job) + Send + 'static,
    {
        let mut subscription = self.subscribe(job_id)?;
        let task = tokio::spawn(async move {
            while let Some(job) = subscription.recv().await {
                on_update(job);
            }
        });
        Ok(UpdateHandle::new(task.abort_handle()))
    }

    /// Cancel a validating or running job. Finished jobs are left untouched.
    pub fn cancel(&self, job_id: Uuid) -> Result<CancelOutcome, EngineError> {
        let cancelled = {
            let mut registry = self.registry.lock();
            let entry = registry
                .jobs
                .get_mut(&job_id)
                .ok_or(EngineError::JobNotFound(job_id))?;

            if !entry.job.cancel() {
                tracing::debug!(
                    job_id = %job_id,
                    state = %entry.job.state,
                    "Cancel ignored, job already finished"
                );
                return Ok(CancelOutcome::AlreadyTerminal(entry.job.state));
            }
            if let Some(driver) = entry.driver.take() {
                driver.abort();
            }
            entry.publish();
            entry.job.clone()
        };

        record_terminal(&cancelled);
        tracing::info!(
            job_id = %job_id,
            progress = cancelled.progress,
            "Transcription job cancelled"
        );
        Ok(CancelOutcome::Cancelled)
    }

    /// Current snapshot of a job.
    pub fn result(&self, job_id: Uuid) -> Result<Job, EngineError> {
        self.registry
            .lock()
            .jobs
            .get(&job_id)
            .map(|entry| entry.job.clone())
            .ok_or(EngineError::JobNotFound(job_id))
    }

    /// Snapshots matching `filter`, newest first.
    pub fn list(&self, filter: &JobFilter) -> Vec<Job> {
        let mut jobs: Vec<Job> = self
            .registry
            .lock()
            .jobs
            .values()
            .filter(|entry| filter.matches(&entry.job))
            .map(|entry| entry.job.clone())
            .collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        jobs
    }

    /// Drop a job from the engine, cancelling it first if it is still active.
    pub fn discard(&self, job_id: Uuid) -> Result<Job, EngineError> {
        self.cancel(job_id)?;
        let entry = self
            .registry
            .lock()
            .jobs
            .remove(&job_id)
            .ok_or(EngineError::JobNotFound(job_id))?;
        tracing::info!(job_id = %job_id, state = %entry.job.state, "Transcription job discarded");
        Ok(entry.job)
    }

    pub fn stats(&self) -> EngineStats {
        let registry = self.registry.lock();
        EngineStats {
            total_jobs: registry.jobs.len(),
            active_jobs: registry
                .jobs
                .values()
                .filter(|entry| entry.job.state.is_active())
                .count(),
        }
    }

    /// Apply `apply` to a live job and publish the result if it changed anything.
    fn transition<F>(&self, job_id: Uuid, apply: F) -> Transition
    where
        F: FnOnce(&mut Job) -> bool,
    {
        let mut registry = self.registry.lock();
        let Some(entry) = registry.jobs.get_mut(&job_id) else {
            return Transition::Closed;
        };
        if entry.job.state.is_terminal() {
            return Transition::Closed;
        }
        if !apply(&mut entry.job) {
            return Transition::Unchanged;
        }
        entry.publish();
        Transition::Applied(entry.job.clone())
    }

    async fn drive(self, job_id: Uuid) {
        let Transition::Applied(job) = self.transition(job_id, |job| job.start_running()) else {
            return;
        };
        tracing::debug!(job_id = %job_id, kind = %job.kind, "Validation passed, job running");

        let schedule = self.settings.progress.schedule(job.kind);
        let period = schedule.interval.max(Duration::from_millis(1));
        let started = Instant::now();

        let processing = self.backend.transcribe(job.kind, &job.source);
        tokio::pin!(processing);

        let mut ticker = tokio::time::interval_at(started + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut ticking = schedule.next(0).is_some();

        let outcome = loop {
            tokio::select! {
                biased;
                outcome = &mut processing => break outcome,
                _ = ticker.tick(), if ticking => {
                    let tick = self.transition(job_id, |job| match schedule.next(job.progress) {
                        Some(next) => job.advance(next),
                        None => false,
                    });
                    match tick {
                        Transition::Applied(job) => ticking = schedule.next(job.progress).is_some(),
                        Transition::Unchanged => ticking = false,
                        Transition::Closed => return,
                    }
                }
            }
        };

        let elapsed = started.elapsed();
        let finished = match outcome {
            Ok(text) => self.transition(job_id, move |job| job.succeed(text)),
            Err(fault) => {
                tracing::warn!(job_id = %job_id, error = %fault, "Transcription backend fault");
                self.transition(job_id, move |job| {
                    job.fail(JobError::processing_fault(fault.0))
                })
            }
        };

        if let Transition::Applied(job) = finished {
            metrics::histogram!("transcription_processing_seconds", "kind" => job.kind.to_string())
                .record(elapsed.as_secs_f64());
            record_terminal(&job);
            tracing::info!(
                job_id = %job_id,
                state = %job.state,
                elapsed_ms = elapsed.as_millis() as u64,
                "Transcription job finished"
            );
        }
    }
}

fn record_terminal(job: &Job) {
    let kind = job.kind.to_string();
    match job.state {
        JobState::Succeeded => {
            metrics::counter!("transcription_jobs_completed", "kind" => kind).increment(1)
        }
        JobState::Failed => {
            metrics::counter!("transcription_jobs_failed", "kind" => kind).increment(1)
        }
        JobState::Cancelled => {
            metrics::counter!("transcription_jobs_cancelled", "kind" => kind).increment(1)
        }
        JobState::Validating | JobState::Running => return,
    }
    metrics::gauge!("transcription_active_jobs").decrement(1.0);
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("{media_type:?} is not a valid {expected} file (expected {expected}/*)")]
    InvalidInputKind { expected: JobKind, media_type: String },

    #[error("File is empty")]
    EmptyFile,

    #[error("File is {size} bytes, the limit is {limit} bytes")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("Job {0} not found")]
    JobNotFound(Uuid),
}
