//! Error types for phyto-id
//!
//! Every handler error renders as `{"error": {"code", "message"}}`.

use crate::db::StoreError;
use crate::identification::IdentificationError;
use crate::services::ResolveError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Identification produced no usable candidate (404)
    #[error("No plant match found")]
    NoMatch,

    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Identification provider unreachable or misconfigured (502)
    #[error("Identification failed: {0}")]
    Identification(#[from] IdentificationError),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Persistence failure (500)
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// phyto-common error
    #[error("Common error: {0}")]
    Common(#[from] phyto_common::Error),
}

impl From<ResolveError> for ApiError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::NoMatch => ApiError::NoMatch,
            ResolveError::Persistence(e) => ApiError::Store(e),
        }
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NoMatch | ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Identification(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) | ApiError::Store(_) | ApiError::Common(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.to_string();
        let (error_code, message) = match self {
            ApiError::NoMatch => ("NO_MATCH", message),
            ApiError::NotFound(msg) => ("NOT_FOUND", msg),
            ApiError::BadRequest(msg) => ("BAD_REQUEST", msg),
            ApiError::Identification(_) => ("IDENTIFICATION_FAILED", message),
            ApiError::Internal(msg) => ("INTERNAL_ERROR", msg),
            ApiError::Store(_) => ("STORAGE_ERROR", message),
            ApiError::Common(_) => ("COMMON_ERROR", message),
        };

        if status.is_server_error() {
            tracing::error!(code = error_code, "{}", message);
        }

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::NoMatch, StatusCode::NOT_FOUND),
            (ApiError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (
                ApiError::Identification(IdentificationError::NotConfigured),
                StatusCode::BAD_GATEWAY,
            ),
            (
                ApiError::Store(StoreError::Corrupt("x".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.status_code(), expected);
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_no_match_from_resolver() {
        assert!(matches!(
            ApiError::from(ResolveError::NoMatch),
            ApiError::NoMatch
        ));
    }
}
