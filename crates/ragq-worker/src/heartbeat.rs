use ragq_jobs::JobStore;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Upserts `worker_id`'s liveness row every `interval`. Store failures never
/// reach the worker loop: they back off exponentially, doubling from
/// `retry_base` up to `retry_max` with up to ±20% jitter, and retry on the
/// next tick rather than bubbling an error anywhere.
pub struct HeartbeatLoop {
    store: Arc<dyn JobStore>,
    worker_id: String,
    interval: Duration,
    retry_base: Duration,
    retry_max: Duration,
    shutdown: CancellationToken,
}

impl HeartbeatLoop {
    pub fn new(
        store: Arc<dyn JobStore>,
        worker_id: impl Into<String>,
        interval: Duration,
        retry_base: Duration,
        retry_max: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self { store, worker_id: worker_id.into(), interval, retry_base, retry_max, shutdown }
    }

    pub async fn run(&self) {
        while !self.shutdown.is_cancelled() {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }

            if self.shutdown.is_cancelled() {
                break;
            }

            self.beat_with_backoff().await;
        }
    }

    /// One heartbeat attempt, retried with backoff until it succeeds or the
    /// shutdown signal fires.
    async fn beat_with_backoff(&self) {
        let mut attempt: u32 = 0;
        loop {
            let result = self.store.upsert_heartbeat(&self.worker_id, chrono::Utc::now()).await;
            match result {
                Ok(()) => return,
                Err(error) => {
                    tracing::warn!(worker_id = %self.worker_id, %error, attempt, "heartbeat upsert failed, backing off");
                    let delay = backoff_delay(self.retry_base, self.retry_max, attempt);
                    attempt = attempt.saturating_add(1);
                    tokio::select! {
                        _ = self.shutdown.cancelled() => return,
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }
    }
}

/// `min(retry_base * 2^attempt, retry_max)`, jittered by up to ±20%.
fn backoff_delay(retry_base: Duration, retry_max: Duration, attempt: u32) -> Duration {
    let base = retry_base.as_secs_f64();
    let cap = retry_max.as_secs_f64();
    let raw = (base * 2f64.powi(attempt as i32)).min(cap);

    let jitter = fastrand::f64() * 0.4 - 0.2; // uniform in [-0.2, 0.2]
    let jittered = (raw * (1.0 + jitter)).max(0.0);
    Duration::from_secs_f64(jittered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ragq_jobs::{EnqueueOutcome, Job, JobStatus, JobStoreError};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeStore {
        heartbeats: tokio::sync::Mutex<Vec<(String, chrono::DateTime<chrono::Utc>)>>,
        fail_first_n: AtomicUsize,
    }

    #[async_trait]
    impl JobStore for FakeStore {
        async fn enqueue(
            &self,
            _kind: &str,
            _payload: Option<serde_json::Value>,
            _max_attempts: i32,
        ) -> Result<EnqueueOutcome, JobStoreError> {
            unimplemented!()
        }

        async fn claim_next(&self, _kind: &str) -> Result<Option<Job>, JobStoreError> {
            unimplemented!()
        }

        async fn mark_succeeded(&self, _job_id: &str, _result: serde_json::Value) -> Result<(), JobStoreError> {
            unimplemented!()
        }

        async fn mark_failure(
            &self,
            _job_id: &str,
            _attempts_prior: i32,
            _max_attempts: i32,
            _error_message: &str,
        ) -> Result<(), JobStoreError> {
            unimplemented!()
        }

        async fn list_jobs(
            &self,
            _kind: Option<&str>,
            _status: Option<JobStatus>,
        ) -> Result<Vec<Job>, JobStoreError> {
            unimplemented!()
        }

        async fn get_job(&self, _id: &str) -> Result<Option<Job>, JobStoreError> {
            unimplemented!()
        }

        async fn upsert_heartbeat(
            &self,
            worker_id: &str,
            ts: chrono::DateTime<chrono::Utc>,
        ) -> Result<(), JobStoreError> {
            let remaining = self.fail_first_n.load(Ordering::SeqCst);
            if remaining > 0 {
                self.fail_first_n.fetch_sub(1, Ordering::SeqCst);
                return Err(JobStoreError::NotFound { id: worker_id.to_string() });
            }
            self.heartbeats.lock().await.push((worker_id.to_string(), ts));
            Ok(())
        }
    }

    #[tokio::test]
    async fn repeated_upserts_are_idempotent_per_tick() {
        let store = Arc::new(FakeStore {
            heartbeats: tokio::sync::Mutex::new(Vec::new()),
            fail_first_n: AtomicUsize::new(0),
        });
        let heartbeat = HeartbeatLoop::new(
            store.clone() as Arc<dyn JobStore>,
            "worker-test",
            Duration::from_millis(1),
            Duration::from_millis(1),
            Duration::from_millis(5),
            CancellationToken::new(),
        );

        heartbeat.beat_with_backoff().await;
        heartbeat.beat_with_backoff().await;

        let rows = store.heartbeats.lock().await;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].0, "worker-test");
        assert_eq!(rows[1].0, "worker-test");
        assert!(rows[1].1 >= rows[0].1);
    }

    #[tokio::test]
    async fn beat_with_backoff_retries_past_transient_failures() {
        let store = Arc::new(FakeStore {
            heartbeats: tokio::sync::Mutex::new(Vec::new()),
            fail_first_n: AtomicUsize::new(2),
        });
        let heartbeat = HeartbeatLoop::new(
            store.clone() as Arc<dyn JobStore>,
            "worker-test",
            Duration::from_millis(1),
            Duration::from_millis(1),
            Duration::from_millis(5),
            CancellationToken::new(),
        );

        heartbeat.beat_with_backoff().await;

        let rows = store.heartbeats.lock().await;
        assert_eq!(rows.len(), 1);
        assert_eq!(store.fail_first_n.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let base = Duration::from_millis(100);
        let max = Duration::from_secs(1);

        for attempt in 0..10 {
            let delay = backoff_delay(base, max, attempt);
            let unjittered = (base.as_secs_f64() * 2f64.powi(attempt as i32)).min(max.as_secs_f64());
            let lower = (unjittered * 0.8).max(0.0);
            let upper = unjittered * 1.2 + 0.001;
            assert!(
                delay.as_secs_f64() >= lower && delay.as_secs_f64() <= upper,
                "attempt {attempt}: {delay:?} not in [{lower}, {upper}]"
            );
        }
    }
}
