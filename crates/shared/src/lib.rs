//! Process bootstrap shared by every binary: env loading, tracing
//! initialization, DB pool setup.

use anyhow::Result;
use roomsched_core::PipelineConfig;
use sqlx::SqlitePool;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Loads a `.env` file if present. A no-op when none exists; every
/// `PipelineConfig` field has a default.
pub fn init_env() {
    dotenvy::dotenv().ok();
}

/// Initializes tracing with stdout plus optional rolling JSON-lines file
/// logging under `LOG_DIR` (default `logs/app`). The returned guard must be
/// held for the process lifetime or the file layer stops flushing.
pub fn init_tracing(service_name: &str) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let log_dir = std::env::var("LOG_DIR").unwrap_or_else(|_| "logs/app".to_string());

    let now = chrono::Local::now().format("%y-%m-%d-%H-%M-%S").to_string();
    let filename = format!("roomsched-{service_name}.log.{now}.jsonl");

    let file_appender = tracing_appender::rolling::never(&log_dir, filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let default_filter = format!("info,{service_name}=debug,sqlx=warn");

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(non_blocking),
        )
        .init();

    Some(guard)
}

/// Connects the SQLite pool and runs migrations, per `config.store_path`.
pub async fn init_db(config: &PipelineConfig) -> Result<SqlitePool> {
    let pool = roomsched_store::connect(&config.store_path).await?;
    tracing::info!(path = %config.store_path.display(), "database pool established");
    Ok(pool)
}
