use thiserror::Error;

/// Failure taxonomy for a single job execution. Every variant here becomes a
/// `mark_failure` bookkeeping step in the worker loop; none are retried
/// locally.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("reindex subprocess produced no output")]
    NoOutput,

    #[error("reindex subprocess's last stdout line was not a JSON object: {line}")]
    NonJsonOutput { line: String },

    #[error("reindex subprocess failed: {stderr}")]
    SubprocessFailed { stderr: String },

    #[error("failed to spawn reindex subprocess: {0}")]
    Spawn(#[from] std::io::Error),
}
