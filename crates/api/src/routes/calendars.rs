//! `GET /calendars.json`: the calendar map written alongside the merged
//! schedule (source_hash -> url/name/color/building/room).

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use roomsched_core::CalendarMap;

use crate::error::ApiResult;
use crate::AppState;

async fn list_calendars(State(state): State<AppState>) -> ApiResult<Json<CalendarMap>> {
    let (_schedule, map) = state.schedule_cache.ensure_schedule().await?;
    Ok(Json((*map).clone()))
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/calendars.json", get(list_calendars))
}
