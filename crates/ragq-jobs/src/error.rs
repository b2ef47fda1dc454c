use thiserror::Error;

/// Store-facing error taxonomy. Every operation in [`crate::JobStore`] fails
/// loudly on a store round-trip error rather than swallowing it locally;
/// retry policy lives one layer up, in the worker and heartbeat loops.
#[derive(Debug, Error)]
pub enum JobStoreError {
    #[error("job store round-trip failed: {0}")]
    Store(#[from] sqlx::Error),

    #[error("job row {id} had an unrecognised status {status:?}")]
    UnknownStatus { id: String, status: String },

    #[error("job {id} not found")]
    NotFound { id: String },
}
