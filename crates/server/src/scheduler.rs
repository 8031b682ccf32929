//! C10: the two periodic background tasks: the extraction fetcher and the
//! daily manual-event retention cleanup. Both are disabled together by
//! `PipelineConfig::disable_background_tasks`.

use std::sync::Arc;
use std::time::Duration;

use roomsched_core::PipelineConfig;
use roomsched_extract::Orchestrator;
use sqlx::SqlitePool;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Spawns the periodic fetcher: fires immediately, then every
/// `config.extract_interval_min` minutes. A tick that overlaps a still-running
/// extraction is a no-op: `Orchestrator::run_full_extraction` returns
/// `AlreadyRunning` rather than queuing the tick, so a missed tick is never
/// made up.
pub fn spawn_periodic_fetcher(
    orchestrator: Arc<Orchestrator>,
    config: PipelineConfig,
    shutdown: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let interval = Duration::from_secs(config.extract_interval_min.max(1) * 60);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("periodic fetcher shutting down");
                    return;
                }
                _ = run_once(&orchestrator, &shutdown) => {}
            }

            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("periodic fetcher shutting down");
                    return;
                }
                _ = tokio::time::sleep(interval) => {}
            }
        }
    })
}

async fn run_once(orchestrator: &Orchestrator, shutdown: &CancellationToken) {
    match orchestrator.run_full_extraction(shutdown).await {
        Ok(progress) => info!(
            succeeded = progress.succeeded,
            failed = progress.failed,
            "scheduled extraction run finished"
        ),
        Err(roomsched_extract::ExtractError::AlreadyRunning) => {
            info!("scheduled extraction skipped: a run is already in progress");
        }
        Err(e) => error!(error = %e, "scheduled extraction run failed"),
    }
}

/// Spawns the daily retention cleanup for expired manual events.
pub fn spawn_retention_cleanup(
    store: SqlitePool,
    config: PipelineConfig,
    shutdown: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let now = chrono::Utc::now();
            match roomsched_store::manual_events::cleanup_expired_manual_events(
                &store,
                config.retention_days,
                now,
            )
            .await
            {
                Ok(deleted) => info!(deleted, "retention cleanup finished"),
                Err(e) => error!(error = %e, "retention cleanup failed"),
            }

            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("retention cleanup shutting down");
                    return;
                }
                _ = tokio::time::sleep(DAY) => {}
            }
        }
    })
}
