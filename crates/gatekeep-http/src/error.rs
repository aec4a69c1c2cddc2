//! Error types for the HTTP layer.
//!
//! Every rejection renders as `{"message": ...}` with the matching status.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::types::MessageBody;

/// HTTP-level rejection.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The client IP is banned, or could not be resolved.
    #[error("access denied")]
    Forbidden,

    /// The request overflowed the rate window; the IP is now banned.
    #[error("too many requests, IP blacklisted")]
    TooManyRequests,

    /// The request body could not be parsed.
    #[error("{0}")]
    BadRequest(String),

    /// Internal server error. The detail is logged, never returned.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            ApiError::Internal(msg) => {
                tracing::error!(%msg, "internal server error");
                "internal error".to_string()
            }
            other => other.to_string(),
        };

        (self.status(), axum::Json(MessageBody { message })).into_response()
    }
}
