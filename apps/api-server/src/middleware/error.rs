//! Error handling - maps every failure to a JSON error body.

use std::fmt;

use actix_web::{
    HttpRequest, HttpResponse, ResponseError,
    error::{JsonPayloadError, QueryPayloadError},
    http::StatusCode,
};
use todo_core::ValidationErrors;
use todo_shared::ErrorResponse;

/// Application-level error type rendered as an `ErrorResponse`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Field-level rule violations.
    #[error("Validation error")]
    Validation(#[from] ValidationErrors),

    /// Path identifier is not well formed.
    #[error("{0}")]
    InvalidId(String),

    /// Unique field already taken.
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthorized(String),

    /// Anything unexpected. `error` is surfaced to the client verbatim.
    #[error("{message}: {error}")]
    Internal { message: String, error: String },
}

impl AppError {
    pub fn internal(message: impl Into<String>, error: impl fmt::Display) -> Self {
        AppError::Internal {
            message: message.into(),
            error: error.to_string(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::InvalidId(_)
            | AppError::Conflict(_)
            | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::Validation(errors) => {
                ErrorResponse::new("Validation error").with_errors(errors.to_map())
            }
            AppError::Internal { message, error } => {
                tracing::error!(error = %error, "{}", message);
                ErrorResponse::new(message.clone()).with_error(error.clone())
            }
            other => ErrorResponse::new(other.to_string()),
        };

        HttpResponse::build(self.status_code()).json(body)
    }
}

/// Body deserialization failures become 400s with the standard error body.
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    tracing::debug!(error = %err, "Rejected request body");
    AppError::BadRequest(format!("Malformed request body: {err}")).into()
}

/// Same treatment for query strings that do not fit the expected shape.
pub fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    tracing::debug!(error = %err, "Rejected query string");
    AppError::BadRequest(format!("Malformed query string: {err}")).into()
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    async fn body_of(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.error_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body()).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[actix_web::test]
    async fn test_validation_renders_field_map() {
        let (status, body) =
            body_of(ValidationErrors::single("title", "Title is required.").into()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Validation error");
        assert_eq!(body["errors"]["title"], "Title is required.");
    }

    #[actix_web::test]
    async fn test_internal_surfaces_raw_error() {
        let (status, body) = body_of(AppError::internal("Failed to list todos.", "pool timed out")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Failed to list todos.");
        assert_eq!(body["error"], "pool timed out");
    }

    #[actix_web::test]
    async fn test_status_mapping() {
        assert_eq!(AppError::InvalidId("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Conflict("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Unauthorized("x".into()).status_code(), StatusCode::UNAUTHORIZED);
    }
}
