use anyhow::{Context, Result};
use ragq_config::WorkerConfig;
use ragq_jobs::{JobStore, PgJobStore, RAG_REINDEX_KIND};
use ragq_worker::{HeartbeatLoop, SubprocessRunner, WorkerLoop};
use sqlx::postgres::PgPoolOptions;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,ragq_worker=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = WorkerConfig::from_env().context("failed to load worker configuration")?;
    tracing::info!(worker_id = %config.worker_id, "rag worker starting");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .context("failed to connect to job store database")?;

    sqlx::migrate!("../../migrations")
        .run(&pool)
        .await
        .context("failed to run job store migrations")?;

    let store: Arc<dyn JobStore> = Arc::new(PgJobStore::new(pool));
    let runner = Arc::new(SubprocessRunner {
        binary_path: config.reindex_runner_path.clone(),
        working_dir: config.reindex_working_dir.clone().map(PathBuf::from),
    });

    let shutdown = CancellationToken::new();

    let worker = WorkerLoop::new(
        store.clone(),
        runner,
        RAG_REINDEX_KIND,
        config.poll_interval,
        shutdown.clone(),
    );
    let heartbeat = HeartbeatLoop::new(
        store,
        config.worker_id.clone(),
        config.heartbeat_interval,
        config.retry_base,
        config.retry_max,
        shutdown.clone(),
    );

    let worker_handle = tokio::spawn(async move { worker.run().await });
    let heartbeat_handle = tokio::spawn(async move {
        heartbeat.run().await;
    });

    tokio::pin!(worker_handle);

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(error) = result {
                tracing::error!(%error, "failed to listen for shutdown signal");
            }
            tracing::info!("shutdown signal received, finishing in-flight work");
            shutdown.cancel();
        }
        result = &mut worker_handle => {
            shutdown.cancel();
            if let Ok(Err(error)) = result {
                tracing::error!(%error, "worker loop exited unexpectedly");
            }
        }
    }

    if !worker_handle.is_finished() {
        if let Err(error) = worker_handle.await.context("worker task panicked")? {
            tracing::error!(%error, "worker loop returned an error");
        }
    }
    heartbeat_handle.await.context("heartbeat task panicked")?;

    Ok(())
}
