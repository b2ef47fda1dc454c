//! Process-wide configuration, loaded once at startup and threaded through
//! the worker and reindex runner rather than hidden behind a singleton.

use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

fn env_string(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parsed_min<T>(key: &str, default: T, minimum: T) -> Result<T>
where
    T: std::str::FromStr + PartialOrd + Copy,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => {
            let parsed: T = raw
                .parse()
                .map_err(|e| anyhow::anyhow!("{key} must be numeric: {e}"))?;
            Ok(if parsed < minimum { minimum } else { parsed })
        }
        Err(_) => Ok(default),
    }
}

/// Worker-side configuration: job store connection, poll/heartbeat cadence,
/// retry bounds, and the reindex job's defaults.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub database_url: String,
    pub worker_id: String,
    pub heartbeat_interval: Duration,
    pub poll_interval: Duration,
    pub job_max_attempts: i32,
    pub retry_base: Duration,
    pub retry_max: Duration,
    pub reindex_runner_path: String,
    pub reindex_working_dir: Option<String>,
    pub rag_source_dir: String,
    pub rag_db_path: String,
    pub rag_chunk_size: i64,
    pub rag_chunk_overlap: i64,
}

impl WorkerConfig {
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let database_url =
            env::var("WORKER_DATABASE_URL").context("WORKER_DATABASE_URL must be set")?;

        let heartbeat_secs: u64 = env_parsed_min("WORKER_HEARTBEAT_SECONDS", 30, 1)?;
        let poll_secs: u64 = env_parsed_min("WORKER_POLL_SECONDS", 5, 1)?;
        let job_max_attempts: i32 = env_parsed_min("JOB_MAX_ATTEMPTS", 3, 1)?;
        let retry_base_secs: f64 = env_parsed_min("WORKER_DB_RETRY_BASE_SECONDS", 1.0, 0.1)?;
        let retry_max_secs: f64 = env_parsed_min("WORKER_DB_RETRY_MAX_SECONDS", 30.0, 0.5)?;
        let rag_chunk_size: i64 = env_parsed_min("RAG_CHUNK_SIZE", 500, 100)?;
        let rag_chunk_overlap: i64 = env_parsed_min("RAG_CHUNK_OVERLAP", 50, 0)?;

        Ok(Self {
            database_url,
            worker_id: env_string("WORKER_ID", "worker-1"),
            heartbeat_interval: Duration::from_secs(heartbeat_secs),
            poll_interval: Duration::from_secs(poll_secs),
            job_max_attempts,
            retry_base: Duration::from_secs_f64(retry_base_secs),
            retry_max: Duration::from_secs_f64(retry_max_secs),
            reindex_runner_path: env_string("RAG_REINDEX_RUNNER_PATH", "ragq-reindex"),
            reindex_working_dir: env::var("RAG_REINDEX_WORKING_DIR").ok(),
            rag_source_dir: env_string("RAG_SOURCE_DIR", "./data/sample_docs"),
            rag_db_path: env_string("RAG_DB_PATH", "./data/rag_index.sqlite3"),
            rag_chunk_size,
            rag_chunk_overlap,
        })
    }
}

/// Reindex runner configuration: the pieces the `ragq-reindex` binary reads
/// when a job payload does not override them.
#[derive(Debug, Clone)]
pub struct ReindexConfig {
    pub source_dir: String,
    pub db_path: String,
    pub chunk_size: i64,
    pub chunk_overlap: i64,
    pub embedding_api_key: Option<String>,
    pub embedding_model: String,
    pub embedding_base_url: String,
}

impl ReindexConfig {
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let rag_chunk_size: i64 = env_parsed_min("RAG_CHUNK_SIZE", 500, 100)?;
        let rag_chunk_overlap: i64 = env_parsed_min("RAG_CHUNK_OVERLAP", 50, 0)?;

        Ok(Self {
            source_dir: env_string("RAG_SOURCE_DIR", "./data/sample_docs"),
            db_path: env_string("RAG_DB_PATH", "./data/rag_index.sqlite3"),
            chunk_size: rag_chunk_size,
            chunk_overlap: rag_chunk_overlap,
            embedding_api_key: env::var("OPENAI_API_KEY").ok(),
            embedding_model: env_string("RAG_EMBEDDING_MODEL", "text-embedding-3-small"),
            embedding_base_url: env_string("RAG_EMBEDDING_BASE_URL", "https://api.openai.com/v1"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clear_worker_env() {
        for key in [
            "WORKER_DATABASE_URL",
            "WORKER_ID",
            "WORKER_HEARTBEAT_SECONDS",
            "WORKER_POLL_SECONDS",
            "JOB_MAX_ATTEMPTS",
            "WORKER_DB_RETRY_BASE_SECONDS",
            "WORKER_DB_RETRY_MAX_SECONDS",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn worker_config_requires_database_url() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_worker_env();
        let result = WorkerConfig::from_env();
        assert!(result.is_err());
    }

    #[test]
    fn worker_config_applies_defaults() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_worker_env();
        env::set_var("WORKER_DATABASE_URL", "postgres://localhost/test");
        let config = WorkerConfig::from_env().unwrap();
        assert_eq!(config.worker_id, "worker-1");
        assert_eq!(config.heartbeat_interval, Duration::from_secs(30));
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert_eq!(config.job_max_attempts, 3);
        clear_worker_env();
    }

    #[test]
    fn worker_config_clamps_below_minimum() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_worker_env();
        env::set_var("WORKER_DATABASE_URL", "postgres://localhost/test");
        env::set_var("WORKER_HEARTBEAT_SECONDS", "0");
        let config = WorkerConfig::from_env().unwrap();
        assert_eq!(config.heartbeat_interval, Duration::from_secs(1));
        clear_worker_env();
    }
}
