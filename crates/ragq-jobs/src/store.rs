use crate::error::JobStoreError;
use crate::model::{EnqueueOutcome, Job, JobStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Persists jobs and worker liveness. All operations are single-transaction
/// and fail loudly on store errors; callers (the worker loop, the heartbeat
/// loop) layer their own retry policy on top.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn enqueue(
        &self,
        kind: &str,
        payload: Option<serde_json::Value>,
        max_attempts: i32,
    ) -> Result<EnqueueOutcome, JobStoreError>;

    async fn claim_next(&self, kind: &str) -> Result<Option<Job>, JobStoreError>;

    async fn mark_succeeded(
        &self,
        job_id: &str,
        result: serde_json::Value,
    ) -> Result<(), JobStoreError>;

    async fn mark_failure(
        &self,
        job_id: &str,
        attempts_prior: i32,
        max_attempts: i32,
        error_message: &str,
    ) -> Result<(), JobStoreError>;

    async fn list_jobs(
        &self,
        kind: Option<&str>,
        status: Option<JobStatus>,
    ) -> Result<Vec<Job>, JobStoreError>;

    async fn get_job(&self, id: &str) -> Result<Option<Job>, JobStoreError>;

    async fn upsert_heartbeat(
        &self,
        worker_id: &str,
        ts: DateTime<Utc>,
    ) -> Result<(), JobStoreError>;
}

/// Seam between row-locking and non-locking store drivers (design notes §9).
/// `PgJobStore` always has `SELECT ... FOR UPDATE SKIP LOCKED` available and
/// wires [`Pessimistic`] by default; [`Optimistic`] exists so a future
/// non-locking driver can reuse the rest of `PgJobStore` unchanged.
#[async_trait]
pub trait ClaimStrategy: Send + Sync {
    async fn claim(
        &self,
        pool: &sqlx::PgPool,
        kind: &str,
    ) -> Result<Option<Job>, JobStoreError>;
}
