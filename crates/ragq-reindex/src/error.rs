use thiserror::Error;

/// Error taxonomy for a single reindex run. `SelfCheckFailure` and
/// `EmbeddingFailure` are both surfaced to the worker as [`RunnerError`]
/// proper; the CLI binary maps any variant to exit code 1 and the
/// `"[rag-reindex-runner] failed: <message>"` stderr line.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("chunk_size must be > 0")]
    InvalidChunkSize,

    #[error("chunk_overlap ({overlap}) must be smaller than chunk_size ({size})")]
    InvalidChunkOverlap { overlap: i64, size: i64 },

    #[error("source directory not found: {path}")]
    SourceDirNotFound { path: String },

    #[error("source path is not a directory: {path}")]
    SourceNotADirectory { path: String },

    #[error("no non-empty supported documents found in {source_dir} (supported: .txt, .md)")]
    NoDocuments { source_dir: String },

    #[error("embedding request failed: {0}")]
    EmbeddingFailure(String),

    #[error("index artifact error: {0}")]
    IndexStore(#[from] ragq_index::IndexStoreError),

    #[error("filesystem error: {0}")]
    Io(#[from] std::io::Error),

    #[error("payload_json must be a JSON object")]
    InvalidPayload,
}
