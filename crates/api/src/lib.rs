//! roomsched-api: the read-optimized public HTTP surface over the merged
//! schedule: `/health`, `/events.json`, `/calendars.json`,
//! `/departures.json`, `/debug/pipeline`. Admin CRUD is store-layer only
//! (§6): this crate never mounts authenticated write routes.

pub mod config;
pub mod error;
pub mod query;
mod routes;

use axum::Router;
use roomsched_artifact::ArtifactStore;
use roomsched_merge::ScheduleCache;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub schedule_cache: Arc<ScheduleCache>,
    pub artifacts: ArtifactStore,
    pub store: SqlitePool,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::routes())
        .merge(routes::events::routes())
        .merge(routes::calendars::routes())
        .merge(routes::departures::routes())
        .merge(routes::debug::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Runs the HTTP server until `shutdown` resolves.
pub async fn run_api(
    state: AppState,
    config: &config::ApiConfig,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = create_router(state);
    let addr = format!("{}:{}", config.host, config.port);

    tracing::info!(%addr, "API server listening");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
