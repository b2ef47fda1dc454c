//! Reindex runner: the `rag_reindex` job's pure body. Loads documents from a
//! source directory, chunks and embeds them, writes a fresh index artifact to
//! a temp location, self-checks it, and atomically swaps it into place.

mod chunker;
mod embedding;
mod error;
mod loader;
mod runner;

pub use chunker::chunk_documents;
pub use embedding::{EmbeddingClient, OpenAiEmbeddingClient};
pub use error::RunnerError;
pub use loader::load_documents;
pub use runner::{run_reindex, ReindexMetrics};
