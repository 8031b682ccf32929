//! Liveness probe; no dependency on the schedule cache or store.

use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_response_serializes_as_ok() {
        let json = serde_json::to_string(&HealthResponse {
            status: "ok".to_string(),
        })
        .unwrap();
        assert!(json.contains("ok"));
    }
}
