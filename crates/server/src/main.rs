use std::sync::Arc;

use anyhow::Result;
use roomsched_api::{config::ApiConfig, create_router, AppState};
use roomsched_artifact::ArtifactStore;
use roomsched_core::PipelineConfig;
use roomsched_extract::Orchestrator;
use roomsched_merge::ScheduleCache;
use tokio::signal;
use tokio_util::sync::CancellationToken;

mod scheduler;

#[tokio::main]
async fn main() -> Result<()> {
    roomsched_shared::init_env();
    let _guard = roomsched_shared::init_tracing("server");

    tracing::info!("starting roomsched server");

    let config = PipelineConfig::from_env()?;
    let pool = roomsched_shared::init_db(&config).await?;

    let artifacts = ArtifactStore::new(&config.artifact_dir);
    let schedule_cache = Arc::new(ScheduleCache::new(artifacts.clone(), pool.clone()));
    let orchestrator = Arc::new(Orchestrator::new(artifacts.clone(), pool.clone(), config.clone())?);

    let shutdown = CancellationToken::new();

    let mut handles = Vec::new();
    if !config.disable_background_tasks {
        handles.push(scheduler::spawn_periodic_fetcher(
            orchestrator.clone(),
            config.clone(),
            shutdown.clone(),
        ));
        handles.push(scheduler::spawn_retention_cleanup(
            pool.clone(),
            config.clone(),
            shutdown.clone(),
        ));
        tracing::info!("background tasks started");
    } else {
        tracing::info!("background tasks disabled via DISABLE_BACKGROUND_TASKS");
    }

    let state = AppState {
        schedule_cache,
        artifacts,
        store: pool,
    };
    let api_config = ApiConfig::from_env();

    let api_shutdown = shutdown.clone();
    let api_handle = tokio::spawn(async move {
        let app = create_router(state);
        let addr = format!("{}:{}", api_config.host, api_config.port);
        tracing::info!(%addr, "API server listening");

        let listener = match tokio::net::TcpListener::bind(&addr).await {
            Ok(listener) => listener,
            Err(e) => {
                tracing::error!(error = %e, "failed to bind API listener");
                return;
            }
        };

        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move { api_shutdown.cancelled().await })
            .await;
        if let Err(e) = result {
            tracing::error!(error = %e, "API server exited with error");
        }
    });

    wait_for_shutdown().await;
    tracing::info!("shutdown signal received");
    shutdown.cancel();

    let _ = api_handle.await;
    for handle in handles {
        let _ = handle.await;
    }

    tracing::info!("all services stopped gracefully");
    Ok(())
}

async fn wait_for_shutdown() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
