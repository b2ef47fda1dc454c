use crate::chunk_id::chunk_index;
use crate::embedding::{decode, encode};
use crate::error::IndexStoreError;
use crate::model::{ChunkInput, DocumentInput, StoredChunk};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::path::Path;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS documents (
        id TEXT PRIMARY KEY,
        source_path TEXT NOT NULL UNIQUE,
        content_hash TEXT NOT NULL,
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    );

    CREATE TABLE IF NOT EXISTS chunks (
        id TEXT PRIMARY KEY,
        doc_id TEXT NOT NULL REFERENCES documents(id) ON DELETE CASCADE,
        chunk_index INTEGER NOT NULL,
        text TEXT NOT NULL,
        token_count INTEGER NOT NULL,
        embedding BLOB NOT NULL,
        embedding_dim INTEGER NOT NULL,
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        UNIQUE (doc_id, chunk_index)
    );

    CREATE INDEX IF NOT EXISTS idx_chunks_doc_id ON chunks(doc_id);
    CREATE INDEX IF NOT EXISTS idx_documents_source_path ON documents(source_path);
    CREATE INDEX IF NOT EXISTS idx_chunks_created_at ON chunks(created_at);
";

async fn open(path: &Path) -> Result<SqlitePool, IndexStoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let options = SqliteConnectOptions::new().filename(path).create_if_missing(true);
    let pool = SqlitePoolOptions::new().max_connections(1).connect_with(options).await?;
    Ok(pool)
}

fn content_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(text.as_bytes());
    format!("{digest:x}")
}

/// Writes a fresh index artifact at `temp_path`: applies the schema, deletes
/// any existing rows (full replacement, not incremental), then inserts
/// `documents` (sorted by id) and `chunks`/`embeddings` (zipped by position).
pub async fn write(
    temp_path: &Path,
    documents: &[DocumentInput],
    chunks: &[ChunkInput],
    embeddings: &[Vec<f32>],
) -> Result<(), IndexStoreError> {
    if chunks.len() != embeddings.len() {
        return Err(IndexStoreError::MismatchedLengths {
            chunks: chunks.len(),
            embeddings: embeddings.len(),
        });
    }

    for chunk in chunks {
        chunk_index(&chunk.chunk_id)?;
    }

    let pool = open(temp_path).await?;
    sqlx::query(SCHEMA).execute(&pool).await?;

    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM chunks").execute(&mut *tx).await?;
    sqlx::query("DELETE FROM documents").execute(&mut *tx).await?;

    let mut sorted_documents = documents.to_vec();
    sorted_documents.sort_by(|a, b| a.id.cmp(&b.id));

    for document in &sorted_documents {
        sqlx::query("INSERT INTO documents (id, source_path, content_hash) VALUES (?, ?, ?)")
            .bind(&document.id)
            .bind(&document.source_path)
            .bind(content_hash(&document.text))
            .execute(&mut *tx)
            .await?;
    }

    let known_doc_ids: std::collections::HashSet<&str> =
        sorted_documents.iter().map(|d| d.id.as_str()).collect();

    for (chunk, embedding) in chunks.iter().zip(embeddings.iter()) {
        let index = chunk_index(&chunk.chunk_id)?;
        let token_count = chunk.text.split_whitespace().count() as i64;

        if !known_doc_ids.contains(chunk.doc_id.as_str()) {
            return Err(IndexStoreError::UnknownDocId {
                chunk_id: chunk.chunk_id.clone(),
                doc_id: chunk.doc_id.clone(),
            });
        }

        sqlx::query(
            "INSERT INTO chunks (id, doc_id, chunk_index, text, token_count, embedding, embedding_dim)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&chunk.chunk_id)
        .bind(&chunk.doc_id)
        .bind(index)
        .bind(&chunk.text)
        .bind(token_count)
        .bind(encode(embedding))
        .bind(embedding.len() as i64)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    pool.close().await;

    Ok(())
}

/// Post-write probe: returns `(chunk_count, max_embedding_dim)`, failing if
/// either is zero.
pub async fn self_check(path: &Path) -> Result<(i64, i64), IndexStoreError> {
    if !path.exists() {
        return Err(IndexStoreError::NotFound { path: path.to_path_buf() });
    }

    let options = SqliteConnectOptions::new().filename(path).create_if_missing(false);
    let pool = SqlitePoolOptions::new().max_connections(1).connect_with(options).await?;

    let row = sqlx::query(
        "SELECT COUNT(*) as chunk_count, COALESCE(MAX(embedding_dim), 0) as max_embedding_dim FROM chunks",
    )
    .fetch_one(&pool)
    .await?;

    let chunk_count: i64 = row.try_get("chunk_count")?;
    let max_embedding_dim: i64 = row.try_get("max_embedding_dim")?;
    pool.close().await;

    if chunk_count == 0 || max_embedding_dim == 0 {
        return Err(IndexStoreError::SelfCheckFailure { chunk_count, max_embedding_dim });
    }

    Ok((chunk_count, max_embedding_dim))
}

/// Loads all chunks joined against their document's source path, ordered by
/// `chunks.id` ascending. Rows whose decoded embedding length disagrees with
/// the stored `embedding_dim` are silently skipped as corrupt.
pub async fn load(path: &Path) -> Result<Vec<StoredChunk>, IndexStoreError> {
    if !path.exists() {
        return Err(IndexStoreError::NotFound { path: path.to_path_buf() });
    }

    let options = SqliteConnectOptions::new().filename(path).create_if_missing(false);
    let pool = SqlitePoolOptions::new().max_connections(1).connect_with(options).await?;

    let rows = sqlx::query(
        "SELECT c.id as chunk_id, d.source_path as source_path, c.text as text,
                c.embedding as embedding, c.embedding_dim as embedding_dim
         FROM chunks c
         JOIN documents d ON d.id = c.doc_id
         ORDER BY c.id ASC",
    )
    .fetch_all(&pool)
    .await?;
    pool.close().await;

    let mut result = Vec::with_capacity(rows.len());
    for row in rows {
        let chunk_id: String = row.try_get("chunk_id")?;
        let source_path: String = row.try_get("source_path")?;
        let text: String = row.try_get("text")?;
        let embedding_bytes: Vec<u8> = row.try_get("embedding")?;
        let embedding_dim: i64 = row.try_get("embedding_dim")?;

        let Some(embedding) = decode(&embedding_bytes) else {
            continue;
        };
        if embedding.len() as i64 != embedding_dim {
            continue;
        }

        result.push(StoredChunk { chunk_id, source_path, text, embedding });
    }

    Ok(result)
}
