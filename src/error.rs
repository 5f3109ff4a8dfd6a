//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Application-wide error type.
///
/// # Error Categories
///
/// - **Validation**: malformed or out-of-range input
/// - **Authentication**: missing, unknown, expired or disabled secrets
/// - **Authorization**: bootstrap attempted after keys exist
/// - **Resource**: key absent or owned by someone else
/// - **Internal**: secret collisions that outlived the retry budget, database failures
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed (e.g., connection error, query error).
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Request body or parameters are invalid.
    ///
    /// Returns HTTP 400 Bad Request. The String says what was invalid.
    #[error("Invalid request")]
    Validation(String),

    /// Secret is missing, unknown, expired, or belongs to a disabled key.
    ///
    /// Returns HTTP 401 Unauthorized. The cause is deliberately not exposed.
    #[error("Invalid or expired API key")]
    Unauthorized,

    /// The unauthenticated bootstrap path was used after keys already exist.
    ///
    /// Returns HTTP 403 Forbidden.
    #[error("API keys already exist, bootstrap is disabled")]
    Forbidden,

    /// Key does not exist or doesn't belong to the authenticated owner.
    ///
    /// Returns HTTP 404 Not Found in both cases.
    #[error("API key not found")]
    NotFound,

    /// A generated secret collided with an existing one.
    ///
    /// Creation retries on this internally; it only reaches a client once
    /// the retry budget is exhausted, and then as a 500.
    #[error("Secret collision")]
    Conflict,
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl AppError {
    /// HTTP status and stable machine-readable code for this error.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized"),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "forbidden"),
            AppError::NotFound => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Conflict | AppError::Database(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        }
    }
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// ```json
/// {
///   "error": {
///     "code": "error_type",
///     "message": "Human-readable error message"
///   }
/// }
/// ```
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            AppError::Validation(msg) => msg.clone(),
            AppError::Conflict | AppError::Database(_) => {
                tracing::error!(error = %self, "request failed with internal error");
                "An internal error occurred".to_string()
            }
            _ => self.to_string(),
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_variants_to_status_codes() {
        let cases = [
            (AppError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (AppError::Unauthorized, StatusCode::UNAUTHORIZED),
            (AppError::Forbidden, StatusCode::FORBIDDEN),
            (AppError::NotFound, StatusCode::NOT_FOUND),
            (AppError::Conflict, StatusCode::INTERNAL_SERVER_ERROR),
            (
                AppError::Database(sqlx::Error::RowNotFound),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }

    #[tokio::test]
    async fn internal_errors_hide_details() {
        let response = AppError::Database(sqlx::Error::PoolTimedOut).into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(body["error"]["code"], "internal_error");
        assert_eq!(body["error"]["message"], "An internal error occurred");
    }

    #[tokio::test]
    async fn validation_errors_carry_their_message() {
        let response = AppError::Validation("name must not be empty".into()).into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(body["error"]["code"], "validation_error");
        assert_eq!(body["error"]["message"], "name must not be empty");
    }
}
