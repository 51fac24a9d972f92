use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Utc;
use futures_util::future::join_all;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info, instrument, warn};

use super::error::JobError;
use crate::constants::{
    DEFAULT_JOB_MAX_ATTEMPTS, JOB_BATCH_SIZE, JOB_LEASE_TIMEOUT, JOB_RETRY_BACKOFF,
};
use crate::matching::MatchingPipeline;
use crate::model::{EnrichmentJob, JobKind};
use crate::store::Store;
use crate::verification::{ClaimVerifier, PhotoVerifier};

/// Default wake-up interval when no nudge arrives.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq)]
pub struct WorkerConfig {
    pub poll_interval: Duration,
    pub max_attempts: u32,
    /// Attempt `n` is retried after `n * retry_backoff`.
    pub retry_backoff: Duration,
    pub batch_size: usize,
    pub lease: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_JOB_MAX_ATTEMPTS,
            retry_backoff: JOB_RETRY_BACKOFF,
            batch_size: JOB_BATCH_SIZE,
            lease: JOB_LEASE_TIMEOUT,
        }
    }
}

/// Leases due jobs and runs each on its own task.
///
/// Cloning is cheap; clones share the wake-up signal and the stop flag.
#[derive(Clone)]
pub struct JobWorker {
    store: Arc<dyn Store>,
    matching: Arc<MatchingPipeline>,
    claims: Arc<ClaimVerifier>,
    photos: Arc<PhotoVerifier>,
    config: WorkerConfig,
    wake: Arc<Notify>,
    stopping: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
}

impl JobWorker {
    pub fn new(
        store: Arc<dyn Store>,
        matching: Arc<MatchingPipeline>,
        claims: Arc<ClaimVerifier>,
        photos: Arc<PhotoVerifier>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            store,
            matching,
            claims,
            photos,
            config,
            wake: Arc::new(Notify::new()),
            stopping: Arc::new(AtomicBool::new(false)),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Wakes the loop ahead of its next tick.
    pub fn nudge(&self) {
        self.wake.notify_one();
    }

    /// Asks the loop to exit after its current batch.
    pub fn shutdown(&self) {
        self.stopping.store(true, Ordering::Release);
        self.wake.notify_one();
    }

    /// Starts the polling loop (no-op if one is already running).
    pub fn spawn(&self) -> JoinHandle<()> {
        if self.running.swap(true, Ordering::AcqRel) {
            return tokio::spawn(async {});
        }
        let worker = self.clone();
        tokio::spawn(async move {
            worker.run().await;
            worker.running.store(false, Ordering::Release);
        })
    }

    async fn run(&self) {
        let mut interval = time::interval(self.config.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            poll_interval_ms = self.config.poll_interval.as_millis() as u64,
            "Job worker started"
        );

        loop {
            tokio::select! {
                _ = interval.tick() => {}
                _ = self.wake.notified() => {}
            }
            if self.stopping.load(Ordering::Acquire) {
                break;
            }
            if let Err(e) = self.run_due().await {
                warn!(error = %e, "Leasing due jobs failed");
            }
        }
        info!("Job worker stopped");
    }

    /// Leases one batch of due jobs, runs them concurrently and waits for all.
    ///
    /// Returns how many jobs were leased.
    pub async fn run_due(&self) -> Result<usize, JobError> {
        let jobs = self
            .store
            .lease_due_jobs(Utc::now(), self.config.batch_size, self.config.lease)
            .await?;
        let leased = jobs.len();
        if leased == 0 {
            return Ok(0);
        }
        debug!(jobs = leased, "Leased jobs");

        let handles = jobs.into_iter().map(|job| {
            let worker = self.clone();
            tokio::spawn(async move { worker.process(job).await })
        });
        for joined in join_all(handles).await {
            if let Err(e) = joined {
                error!(error = %e, "Job task panicked");
            }
        }
        Ok(leased)
    }

    #[instrument(skip(self, job), fields(job_id = %job.id, kind = %job.kind, target_id = %job.target_id, attempt = job.attempts))]
    async fn process(&self, job: EnrichmentJob) {
        let result = self.execute(&job).await;
        let bookkeeping = match result {
            Ok(()) => self.store.complete_job(job.id).await,
            Err(e) if e.is_retryable() && job.attempts < self.config.max_attempts => {
                let delay = self.config.retry_backoff * job.attempts;
                warn!(
                    error = %e,
                    retry_in_ms = delay.as_millis() as u64,
                    "Job failed; rescheduling"
                );
                let run_at = Utc::now()
                    + chrono::Duration::from_std(delay).unwrap_or_else(|_| chrono::Duration::zero());
                self.store.reschedule_job(job.id, run_at, &e.to_string()).await
            }
            Err(e) => {
                error!(error = %e, "Job failed permanently");
                self.store.fail_job(job.id, &e.to_string()).await
            }
        };
        if let Err(e) = bookkeeping {
            warn!(error = %e, "Recording job result failed; lease expiry will retry it");
        }
    }

    async fn execute(&self, job: &EnrichmentJob) -> Result<(), JobError> {
        match job.kind {
            JobKind::MatchItem => {
                let summary = self.matching.run_for_item(job.target_id).await?;
                info!(
                    strategy = ?summary.strategy,
                    candidates = summary.candidates,
                    persisted = summary.persisted,
                    notifications = summary.notifications,
                    skipped = ?summary.skipped,
                    "Matching finished"
                );
            }
            JobKind::VerifyClaim => {
                let outcome = self.claims.verify(job.target_id).await?;
                info!(outcome = ?outcome, "Claim verification finished");
            }
            JobKind::VerifyPhotos => {
                let outcome = self.photos.verify(job.target_id).await?;
                info!(outcome = ?outcome, "Photo verification finished");
            }
        }
        Ok(())
    }
}
