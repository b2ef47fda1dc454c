use crate::error::JobStoreError;
use crate::id::{coerce_job_id, trailing_numeric_suffix};
use crate::model::{EnqueueOutcome, Job, JobRow, JobStatus};
use crate::store::{ClaimStrategy, JobStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

const JOB_ROW_COLUMNS: &str = "id, type, status, payload_json, attempts, max_attempts, \
     created_at, updated_at, started_at, finished_at, error, result_json";

/// A claim strategy using `SELECT ... FOR UPDATE SKIP LOCKED` inside a
/// transaction. This is the variant wired to Postgres, which always supports
/// row-level skip-locking. Grounded in the CTE used by the teacher's
/// `Job::claim_jobs`.
pub struct Pessimistic;

#[async_trait]
impl ClaimStrategy for Pessimistic {
    async fn claim(&self, pool: &PgPool, kind: &str) -> Result<Option<Job>, JobStoreError> {
        let mut tx = pool.begin().await?;

        let row: Option<JobRow> = sqlx::query_as(&format!(
            "WITH next_job AS (
                SELECT id FROM jobs
                WHERE type = $1 AND status = 'queued'
                ORDER BY created_at ASC, id ASC
                LIMIT 1
                FOR UPDATE SKIP LOCKED
            )
            UPDATE jobs
            SET status = 'running', started_at = now(), finished_at = NULL,
                error = NULL, updated_at = now()
            WHERE id IN (SELECT id FROM next_job)
            RETURNING {JOB_ROW_COLUMNS}"
        ))
        .bind(kind)
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;

        row.map(Job::try_from).transpose()
    }
}

/// A claim strategy using a conditional `UPDATE ... WHERE status = 'queued'`
/// and treating a zero-row update as a lost race rather than an error. Kept
/// for stores without row-level locking (design notes §9); retries a bounded
/// number of times against fresh candidates before giving up and returning
/// `None`.
pub struct Optimistic {
    max_attempts: usize,
}

impl Optimistic {
    pub fn new() -> Self {
        Self { max_attempts: 5 }
    }
}

impl Default for Optimistic {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ClaimStrategy for Optimistic {
    async fn claim(&self, pool: &PgPool, kind: &str) -> Result<Option<Job>, JobStoreError> {
        for _ in 0..self.max_attempts {
            let candidate: Option<(String,)> = sqlx::query_as(
                "SELECT id FROM jobs
                 WHERE type = $1 AND status = 'queued'
                 ORDER BY created_at ASC, id ASC
                 LIMIT 1",
            )
            .bind(kind)
            .fetch_optional(pool)
            .await?;

            let Some((id,)) = candidate else {
                return Ok(None);
            };

            let row: Option<JobRow> = sqlx::query_as(&format!(
                "UPDATE jobs
                 SET status = 'running', started_at = now(), finished_at = NULL,
                     error = NULL, updated_at = now()
                 WHERE id = $1 AND status = 'queued'
                 RETURNING {JOB_ROW_COLUMNS}"
            ))
            .bind(&id)
            .fetch_optional(pool)
            .await?;

            match row {
                Some(row) => return Job::try_from(row).map(Some),
                // Lost the race on this row; another worker claimed it first.
                // Not an error — loop and try the next candidate.
                None => continue,
            }
        }

        Ok(None)
    }
}

/// Postgres-backed [`JobStore`]. Selects [`Pessimistic`] claiming by default
/// since Postgres always supports skip-locking; [`PgJobStore::with_strategy`]
/// lets tests exercise the optimistic path explicitly.
pub struct PgJobStore {
    pool: PgPool,
    strategy: Box<dyn ClaimStrategy>,
}

impl PgJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool, strategy: Box::new(Pessimistic) }
    }

    pub fn with_strategy(pool: PgPool, strategy: Box<dyn ClaimStrategy>) -> Self {
        Self { pool, strategy }
    }
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn enqueue(
        &self,
        kind: &str,
        payload: Option<serde_json::Value>,
        max_attempts: i32,
    ) -> Result<EnqueueOutcome, JobStoreError> {
        let mut tx = self.pool.begin().await?;

        let existing: Option<(String,)> = sqlx::query_as(
            "SELECT id FROM jobs
             WHERE type = $1 AND status IN ('queued', 'running')
             ORDER BY created_at ASC, id ASC
             LIMIT 1
             FOR UPDATE",
        )
        .bind(kind)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some((existing_id,)) = existing {
            tx.rollback().await?;
            return Ok(EnqueueOutcome::Conflict { existing_job_id: existing_id });
        }

        let all_ids: Vec<(String,)> = sqlx::query_as("SELECT id FROM jobs")
            .fetch_all(&mut *tx)
            .await?;
        let next_suffix = all_ids
            .iter()
            .filter_map(|(id,)| trailing_numeric_suffix(id))
            .max()
            .unwrap_or(0)
            + 1;
        let new_id = next_suffix.to_string();

        sqlx::query(
            "INSERT INTO jobs (id, type, status, payload_json, attempts, max_attempts)
             VALUES ($1, $2, 'queued', $3, 0, $4)",
        )
        .bind(&new_id)
        .bind(kind)
        .bind(&payload)
        .bind(max_attempts)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(EnqueueOutcome::Created(new_id))
    }

    async fn claim_next(&self, kind: &str) -> Result<Option<Job>, JobStoreError> {
        self.strategy.claim(&self.pool, kind).await
    }

    async fn mark_succeeded(
        &self,
        job_id: &str,
        result: serde_json::Value,
    ) -> Result<(), JobStoreError> {
        let job_id = coerce_job_id(job_id).as_str_repr();

        sqlx::query(
            "UPDATE jobs
             SET status = 'succeeded', result_json = $1, error = NULL,
                 finished_at = now(), updated_at = now()
             WHERE id = $2",
        )
        .bind(result)
        .bind(job_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn mark_failure(
        &self,
        job_id: &str,
        attempts_prior: i32,
        max_attempts: i32,
        error_message: &str,
    ) -> Result<(), JobStoreError> {
        let next = attempts_prior + 1;
        let job_id = coerce_job_id(job_id).as_str_repr();

        if next < max_attempts {
            sqlx::query(
                "UPDATE jobs
                 SET status = 'queued', attempts = $1, error = $2,
                     started_at = NULL, updated_at = now()
                 WHERE id = $3",
            )
            .bind(next)
            .bind(error_message)
            .bind(job_id)
            .execute(&self.pool)
            .await?;
        } else {
            sqlx::query(
                "UPDATE jobs
                 SET status = 'failed', attempts = $1, error = $2,
                     finished_at = now(), updated_at = now()
                 WHERE id = $3",
            )
            .bind(next)
            .bind(error_message)
            .bind(job_id)
            .execute(&self.pool)
            .await?;
        }

        Ok(())
    }

    async fn list_jobs(
        &self,
        kind: Option<&str>,
        status: Option<JobStatus>,
    ) -> Result<Vec<Job>, JobStoreError> {
        let status_str = status.map(|s| s.as_str());

        let rows: Vec<JobRow> = sqlx::query_as(&format!(
            "SELECT {JOB_ROW_COLUMNS} FROM jobs
             WHERE ($1::text IS NULL OR type = $1)
               AND ($2::text IS NULL OR status = $2)
             ORDER BY created_at ASC, id ASC"
        ))
        .bind(kind)
        .bind(status_str)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Job::try_from).collect()
    }

    async fn get_job(&self, id: &str) -> Result<Option<Job>, JobStoreError> {
        let id = coerce_job_id(id).as_str_repr();

        let row: Option<JobRow> = sqlx::query_as(&format!(
            "SELECT {JOB_ROW_COLUMNS} FROM jobs WHERE id::text = $1::text"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Job::try_from).transpose()
    }

    async fn upsert_heartbeat(
        &self,
        worker_id: &str,
        ts: DateTime<Utc>,
    ) -> Result<(), JobStoreError> {
        sqlx::query(
            "INSERT INTO worker_heartbeats (worker_id, last_heartbeat, updated_at)
             VALUES ($1, $2, now())
             ON CONFLICT (worker_id) DO UPDATE
             SET last_heartbeat = EXCLUDED.last_heartbeat, updated_at = now()",
        )
        .bind(worker_id)
        .bind(ts)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
