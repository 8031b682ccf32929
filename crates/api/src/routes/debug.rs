//! `GET /debug/pipeline`: single-pane diagnostic over the extraction
//! pipeline: the fingerprint the cache last rebuilt against, the merged
//! schedule's size, and the most recent `ImportProgress` document.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use roomsched_core::{Fingerprint, ImportProgress};
use serde::Serialize;

use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct PipelineStatus {
    pub fingerprint: Fingerprint,
    pub room_count: usize,
    pub event_count: usize,
    pub progress: Option<ImportProgress>,
}

async fn pipeline_status(State(state): State<AppState>) -> ApiResult<Json<PipelineStatus>> {
    let (schedule, _map) = state.schedule_cache.ensure_schedule().await?;
    let fingerprint = state.artifacts.fingerprint()?;
    let progress = state.artifacts.read_progress()?;

    Ok(Json(PipelineStatus {
        fingerprint,
        room_count: schedule.by_room.len(),
        event_count: schedule.flat.len(),
        progress,
    }))
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/debug/pipeline", get(pipeline_status))
}
