use crate::chunker::chunk_documents;
use crate::embedding::EmbeddingClient;
use crate::error::RunnerError;
use crate::loader::load_documents;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Debug, Clone, Serialize)]
pub struct ReindexMetrics {
    pub documents: i64,
    pub chunks: i64,
    pub db_path: String,
    pub duration_ms: i64,
    pub max_embedding_dim: i64,
    pub embed_model: String,
}

fn temp_path_for(db_path: &Path) -> PathBuf {
    match db_path.extension() {
        Some(ext) => db_path.with_extension(format!("{}.tmp", ext.to_string_lossy())),
        None => db_path.with_extension("tmp"),
    }
}

/// Runs the full reindex algorithm: load, chunk, embed, write to a temp
/// location, self-check, atomically swap in. Any failure before the rename
/// leaves the live file untouched and guarantees the temp file is removed.
pub async fn run_reindex(
    source_dir: &Path,
    db_path: &Path,
    chunk_size: i64,
    chunk_overlap: i64,
    embedding_client: &dyn EmbeddingClient,
) -> Result<ReindexMetrics, RunnerError> {
    let start = Instant::now();
    let temp_path = temp_path_for(db_path);

    if temp_path.exists() {
        std::fs::remove_file(&temp_path)?;
    }

    let result = run_reindex_inner(source_dir, db_path, &temp_path, chunk_size, chunk_overlap, embedding_client)
        .await;

    if temp_path.exists() {
        std::fs::remove_file(&temp_path)?;
    }

    let (document_count, chunk_count, max_embedding_dim) = result?;

    Ok(ReindexMetrics {
        documents: document_count,
        chunks: chunk_count,
        db_path: db_path.display().to_string(),
        duration_ms: start.elapsed().as_millis() as i64,
        max_embedding_dim,
        embed_model: embedding_client.model_name().to_string(),
    })
}

async fn run_reindex_inner(
    source_dir: &Path,
    db_path: &Path,
    temp_path: &Path,
    chunk_size: i64,
    chunk_overlap: i64,
    embedding_client: &dyn EmbeddingClient,
) -> Result<(i64, i64, i64), RunnerError> {
    let documents = load_documents(source_dir)?;
    let chunks = chunk_documents(&documents, chunk_size, chunk_overlap)?;

    let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
    let embeddings = embedding_client.embed_batch(&texts).await?;

    ragq_index::write(temp_path, &documents, &chunks, &embeddings).await?;

    let (chunk_count, max_embedding_dim) = ragq_index::self_check(temp_path).await?;

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::rename(temp_path, db_path)?;

    Ok((documents.len() as i64, chunk_count, max_embedding_dim))
}
