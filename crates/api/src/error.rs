//! Uniform JSON error envelope for the HTTP surface.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, details) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "Bad Request", Some(msg)),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal API error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error", None)
            }
        };

        let body = Json(ErrorResponse {
            error: error.to_string(),
            details,
        });

        (status, body).into_response()
    }
}

impl From<roomsched_merge::MergeError> for ApiError {
    fn from(err: roomsched_merge::MergeError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<roomsched_store::StoreError> for ApiError {
    fn from(err: roomsched_store::StoreError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<roomsched_artifact::ArtifactError> for ApiError {
    fn from(err: roomsched_artifact::ArtifactError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_response_omits_details_when_none() {
        let body = serde_json::to_string(&ErrorResponse {
            error: "Bad Request".to_string(),
            details: None,
        })
        .unwrap();
        assert!(!body.contains("details"));
    }

    #[test]
    fn error_response_includes_details_when_some() {
        let body = serde_json::to_string(&ErrorResponse {
            error: "Bad Request".to_string(),
            details: Some("from must precede to".to_string()),
        })
        .unwrap();
        assert!(body.contains("from must precede to"));
    }
}
