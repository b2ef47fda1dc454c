use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexStoreError {
    #[error("index artifact I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("index artifact database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("index artifact not found at {path}")]
    NotFound { path: PathBuf },

    #[error("chunks and embeddings must have the same length ({chunks} vs {embeddings})")]
    MismatchedLengths { chunks: usize, embeddings: usize },

    #[error("chunk id {chunk_id:?} does not match the \"<doc_id>-<4-digit index>\" format")]
    InvalidChunkId { chunk_id: String },

    #[error("chunk {chunk_id:?} references unknown document {doc_id:?}")]
    UnknownDocId { chunk_id: String, doc_id: String },

    #[error("self-check failed: chunk_count={chunk_count}, max_embedding_dim={max_embedding_dim}")]
    SelfCheckFailure { chunk_count: i64, max_embedding_dim: i64 },
}
