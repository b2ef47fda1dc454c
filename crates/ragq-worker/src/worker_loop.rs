use crate::runner::JobRunner;
use ragq_jobs::{Job, JobStore, JobStoreError};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Single-threaded claim/execute/retry loop. Jobs of a given kind are
/// processed in `(created_at, id)` order under one instance; the single-
/// in-flight invariant on `rag_reindex` means at most one worker makes
/// progress on it at a time even with several processes running.
///
/// Store-layer errors (from `claim_next` or from the `mark_*` bookkeeping
/// calls) propagate out of [`WorkerLoop::run`] rather than being swallowed;
/// the operator restarts the process, which re-claims safely since the
/// previous claim was never committed as terminal.
pub struct WorkerLoop {
    store: Arc<dyn JobStore>,
    runner: Arc<dyn JobRunner>,
    kind: String,
    poll_interval: Duration,
    shutdown: CancellationToken,
}

impl WorkerLoop {
    pub fn new(
        store: Arc<dyn JobStore>,
        runner: Arc<dyn JobRunner>,
        kind: impl Into<String>,
        poll_interval: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self { store, runner, kind: kind.into(), poll_interval, shutdown }
    }

    /// Runs until the shutdown token fires, finishing whatever iteration is
    /// in flight first.
    pub async fn run(&self) -> Result<(), JobStoreError> {
        while !self.shutdown.is_cancelled() {
            if self.tick().await? {
                continue;
            }

            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }

        Ok(())
    }

    /// Claims and executes at most one job. Returns `true` if a job was
    /// claimed (regardless of its outcome), `false` if the queue was empty.
    pub async fn tick(&self) -> Result<bool, JobStoreError> {
        let Some(job) = self.store.claim_next(&self.kind).await? else {
            return Ok(false);
        };

        self.process(&job).await?;
        Ok(true)
    }

    async fn process(&self, job: &Job) -> Result<(), JobStoreError> {
        tracing::info!(job_id = %job.id, kind = %job.kind, "claimed job");

        match self.runner.run(job.payload.clone()).await {
            Ok(result) => {
                tracing::info!(job_id = %job.id, "job succeeded");
                self.store.mark_succeeded(&job.id, result).await
            }
            Err(error) => {
                tracing::warn!(job_id = %job.id, %error, "job failed");
                self.store
                    .mark_failure(&job.id, job.attempts, job.max_attempts, &error.to_string())
                    .await
            }
        }
    }
}
