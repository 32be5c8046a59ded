use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

/// Operational errors surfaced by the engine.
///
/// Recoverable application states (duplicate documents, insufficient
/// evidence, an empty corpus) are ordinary outcomes of their operations,
/// not variants here.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),
    #[error("malformed entry: {0}")]
    MalformedEntry(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("synthesis failed: {0}")]
    SynthesisFailed(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        ApiError::Internal(err.to_string())
    }

    pub fn source<E: std::fmt::Display>(err: E) -> Self {
        ApiError::SourceUnavailable(err.to_string())
    }

    pub fn synthesis<E: std::fmt::Display>(err: E) -> Self {
        ApiError::SynthesisFailed(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        // Diagnostic detail stays in the logs; callers get a stable message.
        let (status, message) = match &self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::MalformedEntry(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            ApiError::SourceUnavailable(msg) => {
                tracing::error!("source unavailable: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    "A research source is currently unavailable".to_string(),
                )
            }
            ApiError::SynthesisFailed(msg) => {
                tracing::error!("synthesis failed: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    "The answer service is temporarily unavailable, please try again".to_string(),
                )
            }
            ApiError::Internal(msg) => {
                tracing::error!("internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal error".to_string(),
                )
            }
        };

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}
