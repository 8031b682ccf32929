//! `GET /departures.json`: today's and tomorrow's events, grouped by room.
//! A lighter-weight view than `/events.json` for dashboard-style consumers
//! who always want "what's on right now and next".

use std::collections::BTreeMap;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{Duration, Utc};
use roomsched_core::RawEvent;
use serde::Serialize;

use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct DeparturesResponse {
    pub today: BTreeMap<String, Vec<RawEvent>>,
    pub tomorrow: BTreeMap<String, Vec<RawEvent>>,
}

async fn departures(State(state): State<AppState>) -> ApiResult<Json<DeparturesResponse>> {
    let (schedule, _map) = state.schedule_cache.ensure_schedule().await?;

    let now = Utc::now();
    let today_start = now.date_naive().and_hms_opt(0, 0, 0).unwrap().and_utc();
    let tomorrow_start = today_start + Duration::days(1);
    let day_after_start = today_start + Duration::days(2);

    let mut today: BTreeMap<String, Vec<RawEvent>> = BTreeMap::new();
    let mut tomorrow: BTreeMap<String, Vec<RawEvent>> = BTreeMap::new();

    for (room, events) in &schedule.by_room {
        for event in events {
            if event.start >= today_start && event.start < tomorrow_start {
                today.entry(room.clone()).or_default().push(event.clone());
            } else if event.start >= tomorrow_start && event.start < day_after_start {
                tomorrow.entry(room.clone()).or_default().push(event.clone());
            }
        }
    }

    Ok(Json(DeparturesResponse { today, tomorrow }))
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/departures.json", get(departures))
}
