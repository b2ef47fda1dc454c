use clap::Parser;
use ragq_config::ReindexConfig;
use ragq_reindex::{run_reindex, EmbeddingClient, OpenAiEmbeddingClient};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "rag-reindex-runner", about = "Run the RAG sqlite reindex with atomic replace")]
struct Args {
    /// Optional JSON object payload with runtime overrides
    /// (source_dir/db_path/chunk_size/chunk_overlap).
    #[arg(long)]
    payload_json: Option<String>,
}

struct RunParams {
    source_dir: PathBuf,
    db_path: PathBuf,
    chunk_size: i64,
    chunk_overlap: i64,
}

fn resolve_params(payload_json: Option<&str>, config: &ReindexConfig) -> anyhow::Result<RunParams> {
    let payload: serde_json::Value = match payload_json {
        None => serde_json::json!({}),
        Some(raw) => serde_json::from_str(raw)?,
    };
    let Some(payload) = payload.as_object() else {
        anyhow::bail!("payload_json must be a JSON object");
    };

    let source_dir = payload
        .get("source_dir")
        .and_then(|v| v.as_str())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(&config.source_dir));
    let db_path = payload
        .get("db_path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(&config.db_path));
    let chunk_size = payload
        .get("chunk_size")
        .and_then(|v| v.as_i64())
        .unwrap_or(config.chunk_size);
    let chunk_overlap = payload
        .get("chunk_overlap")
        .and_then(|v| v.as_i64())
        .unwrap_or(config.chunk_overlap);

    Ok(RunParams { source_dir, db_path, chunk_size, chunk_overlap })
}

async fn run(args: Args) -> anyhow::Result<ragq_reindex::ReindexMetrics> {
    let config = ReindexConfig::from_env()?;
    let params = resolve_params(args.payload_json.as_deref(), &config)?;

    let api_key = config
        .embedding_api_key
        .clone()
        .ok_or_else(|| anyhow::anyhow!("OPENAI_API_KEY must be set"))?;
    let client: Box<dyn EmbeddingClient> = Box::new(OpenAiEmbeddingClient::new(
        api_key,
        config.embedding_model.clone(),
        config.embedding_base_url.clone(),
    ));

    let metrics = run_reindex(
        &params.source_dir,
        &params.db_path,
        params.chunk_size,
        params.chunk_overlap,
        client.as_ref(),
    )
    .await?;

    Ok(metrics)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ReindexConfig {
        ReindexConfig {
            source_dir: "/default/source".to_string(),
            db_path: "/default/db.sqlite3".to_string(),
            chunk_size: 500,
            chunk_overlap: 50,
            embedding_api_key: None,
            embedding_model: "text-embedding-3-small".to_string(),
            embedding_base_url: "https://api.openai.com/v1".to_string(),
        }
    }

    #[test]
    fn resolve_params_falls_back_to_config_defaults() {
        let params = resolve_params(None, &config()).unwrap();
        assert_eq!(params.source_dir, PathBuf::from("/default/source"));
        assert_eq!(params.chunk_size, 500);
    }

    #[test]
    fn resolve_params_applies_payload_overrides() {
        let payload = r#"{"source_dir": "/override", "chunk_size": 200}"#;
        let params = resolve_params(Some(payload), &config()).unwrap();
        assert_eq!(params.source_dir, PathBuf::from("/override"));
        assert_eq!(params.chunk_size, 200);
        assert_eq!(params.chunk_overlap, 50);
    }

    #[test]
    fn resolve_params_rejects_non_object_payload() {
        let result = resolve_params(Some("[1,2,3]"), &config());
        assert!(result.is_err());
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    match run(args).await {
        Ok(metrics) => {
            match serde_json::to_string(&metrics) {
                Ok(line) => {
                    println!("{line}");
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("[rag-reindex-runner] failed: {e}");
                    ExitCode::FAILURE
                }
            }
        }
        Err(e) => {
            eprintln!("[rag-reindex-runner] failed: {e}");
            ExitCode::FAILURE
        }
    }
}
