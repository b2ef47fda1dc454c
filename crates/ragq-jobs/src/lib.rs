//! Durable job queue: a claim/execute/retry worker loop over a relational
//! store, and the enqueue-time single-in-flight guard the HTTP edge relies on.

mod error;
mod id;
mod model;
mod postgres;
mod store;

pub use error::JobStoreError;
pub use id::{coerce_job_id, trailing_numeric_suffix, JobId};
pub use model::{EnqueueOutcome, Job, JobRow, JobStatus, WorkerHeartbeat, RAG_REINDEX_KIND};
pub use postgres::{Optimistic, Pessimistic, PgJobStore};
pub use store::{ClaimStrategy, JobStore};
