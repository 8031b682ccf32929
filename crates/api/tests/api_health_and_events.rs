use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use roomsched_api::{create_router, AppState};
use roomsched_artifact::ArtifactStore;
use roomsched_merge::ScheduleCache;
use serde_json::Value;
use tower::ServiceExt;

async fn test_state() -> (tempfile::TempDir, AppState) {
    let dir = tempfile::tempdir().unwrap();
    let artifacts = ArtifactStore::new(dir.path().join("artifacts"));
    let store = roomsched_store::connect(&dir.path().join("store.sqlite3"))
        .await
        .unwrap();
    let schedule_cache = Arc::new(ScheduleCache::new(artifacts.clone(), store.clone()));
    (
        dir,
        AppState {
            schedule_cache,
            artifacts,
            store,
        },
    )
}

#[tokio::test]
async fn health_endpoint_returns_ok() {
    let (_dir, state) = test_state().await;
    let app = create_router(state);

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn events_json_returns_empty_list_on_fresh_store() {
    let (_dir, state) = test_state().await;
    let app = create_router(state);

    let response = app
        .oneshot(Request::builder().uri("/events.json").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let parsed: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(parsed, serde_json::json!([]));
}

#[tokio::test]
async fn events_json_rejects_inverted_range() {
    let (_dir, state) = test_state().await;
    let app = create_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/events.json?from=2026-01-10T00:00:00Z&to=2026-01-01T00:00:00Z")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn debug_pipeline_reports_zero_on_fresh_store() {
    let (_dir, state) = test_state().await;
    let app = create_router(state);

    let response = app
        .oneshot(Request::builder().uri("/debug/pipeline").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let parsed: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(parsed["event_count"], 0);
    assert_eq!(parsed["progress"], Value::Null);
}
