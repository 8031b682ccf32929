//! `GET /events.json`: the public query surface over C11.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Duration, Utc};
use roomsched_core::RawEvent;
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::query::{query_events, QueryFilters};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub subject: Option<String>,
    pub professor: Option<String>,
    pub room: Option<String>,
    pub building: Option<String>,
    pub group: Option<String>,
}

async fn list_events(
    State(state): State<AppState>,
    Query(params): Query<EventsQuery>,
) -> ApiResult<Json<Vec<RawEvent>>> {
    let now = Utc::now();
    let from = params.from.unwrap_or(now - Duration::days(7));
    let to = params.to.unwrap_or(now + Duration::days(7));

    if from > to {
        return Err(ApiError::BadRequest("from must not be after to".to_string()));
    }

    let filters = QueryFilters {
        subject: params.subject,
        professor: params.professor,
        room: params.room,
        building: params.building,
        group: params.group,
    };

    let events = query_events(&state.schedule_cache, &state.store, from, to, &filters).await?;
    Ok(Json(events))
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/events.json", get(list_events))
}
