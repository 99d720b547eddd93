//! HTTP error handling and response types.
//!
//! Every failure leaves the server as an [`ApiError`] envelope. Store domain
//! errors keep their message; anything unexpected is logged with its detail
//! and answered with a generic 500.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::db::repository::RepositoryError;
use crate::services::ServiceError;
use crate::validation::FieldError;

pub const INTERNAL_MESSAGE: &str = "Internal server error";
pub const INVALID_RESPONSE_MESSAGE: &str = "Invalid response";

/// API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Per-field problems, omitted when empty
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            errors: Vec::new(),
        }
    }

    pub fn with_errors(mut self, errors: Vec<FieldError>) -> Self {
        self.errors = errors;
        self
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    /// The body could not be read; keeps the extractor's status (400, 413)
    Rejected(StatusCode, String),
    MethodNotAllowed,
    /// Request body or parameters failed validation
    Validation(Vec<FieldError>),
    /// A response body failed its output check
    InvalidResponse(Vec<FieldError>),
    /// Internal error; the detail is logged, never returned
    Internal(String),
    Repository(RepositoryError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ApiError::new("NOT_FOUND", msg)),
            AppError::Rejected(status, msg) => {
                let code = match status {
                    StatusCode::PAYLOAD_TOO_LARGE => "PAYLOAD_TOO_LARGE",
                    StatusCode::UNSUPPORTED_MEDIA_TYPE => "UNSUPPORTED_MEDIA_TYPE",
                    _ => "BAD_REQUEST",
                };
                (status, ApiError::new(code, msg))
            }
            AppError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                ApiError::new("METHOD_NOT_ALLOWED", "Method not allowed"),
            ),
            AppError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                ApiError::new("VALIDATION_ERROR", "Invalid request").with_errors(errors),
            ),
            AppError::InvalidResponse(errors) => {
                tracing::error!(?errors, "response failed output validation");
                (
                    StatusCode::BAD_REQUEST,
                    ApiError::new("INVALID_RESPONSE", INVALID_RESPONSE_MESSAGE),
                )
            }
            AppError::Internal(detail) => {
                tracing::error!(error = %detail, "internal error");
                internal()
            }
            AppError::Repository(e) => match e {
                RepositoryError::NotFound { message, .. } => {
                    (StatusCode::NOT_FOUND, ApiError::new("NOT_FOUND", message))
                }
                RepositoryError::Conflict { message, .. } => {
                    (StatusCode::BAD_REQUEST, ApiError::new("CONFLICT", message))
                }
                RepositoryError::ForeignKey { message, .. } => {
                    (StatusCode::BAD_REQUEST, ApiError::new("FOREIGN_KEY", message))
                }
                other => {
                    tracing::error!(error = %other, "repository error");
                    internal()
                }
            },
        };

        (status, Json(error)).into_response()
    }
}

fn internal() -> (StatusCode, ApiError) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        ApiError::new("INTERNAL_ERROR", INTERNAL_MESSAGE),
    )
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        AppError::Repository(err)
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(errors) => AppError::Validation(errors),
            ServiceError::Repository(e) => AppError::Repository(e),
            ServiceError::Cache(e) => AppError::Internal(format!("cache: {}", e)),
            ServiceError::Publish(e) => AppError::Internal(format!("publish: {}", e)),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheError;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_store_errors_map_to_statuses() {
        assert_eq!(
            status_of(RepositoryError::missing("author", 3).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(RepositoryError::conflict("dup").into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(RepositoryError::foreign_key("dangling").into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(RepositoryError::connection("down").into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_cache_failure_is_internal() {
        let err: AppError = ServiceError::Cache(CacheError::Unavailable("x".into())).into();
        assert_eq!(status_of(err), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_rejection_keeps_status() {
        let err = AppError::Rejected(StatusCode::PAYLOAD_TOO_LARGE, "too big".into());
        assert_eq!(status_of(err), StatusCode::PAYLOAD_TOO_LARGE);
        let err = AppError::Rejected(StatusCode::BAD_REQUEST, "broken".into());
        assert_eq!(status_of(err), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_empty_error_list_is_omitted() {
        let body = serde_json::to_value(ApiError::new("NOT_FOUND", "gone")).unwrap();
        assert!(body.get("errors").is_none());
    }
}
