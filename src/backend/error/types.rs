/**
 * Backend Error Types
 *
 * This module defines error types specific to the backend server.
 * These errors are returned from HTTP handlers and converted to JSON
 * responses by the `IntoResponse` impl in `conversion.rs`.
 *
 * # Error Categories
 *
 * ## Handler Errors
 *
 * Request-level failures with an explicit status:
 * - Invalid request body or parameters
 * - Missing or insufficient credentials
 * - Missing resources, duplicates
 *
 * ## Infrastructure Errors
 *
 * Wrapped library errors, converted with `?`:
 * - `sqlx::Error` (row-not-found maps to 404, unique violations to 409)
 * - `jsonwebtoken` errors (401)
 * - `bcrypt` errors (500)
 * - upstream HTTP failures from the story-continuation provider (502)
 */

use axum::http::StatusCode;
use thiserror::Error;

use crate::shared::SharedError;

/// Backend-specific error types
///
/// # Usage
///
/// ```rust
/// use storyloom::backend::error::BackendError;
///
/// let err = BackendError::not_found("Room not found");
/// assert_eq!(err.status_code(), axum::http::StatusCode::NOT_FOUND);
/// ```
#[derive(Debug, Error)]
pub enum BackendError {
    /// Handler error with an explicit status code
    #[error("Handler error: {message}")]
    HandlerError {
        /// HTTP status code for this error
        status: StatusCode,
        /// Human-readable error message
        message: String,
    },

    /// Application state could not be used (e.g. a missing service)
    #[error("State error: {message}")]
    StateError {
        /// Human-readable error message
        message: String,
    },

    /// A call to an external service failed
    #[error("Upstream error: {message}")]
    UpstreamError {
        /// Human-readable error message
        message: String,
    },

    /// Database error
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    /// Token could not be issued or verified
    #[error("Token error: {0}")]
    TokenError(#[from] jsonwebtoken::errors::Error),

    /// Password hashing failed
    #[error("Hashing error: {0}")]
    HashError(#[from] bcrypt::BcryptError),

    /// Shared error (validation, decoding)
    #[error(transparent)]
    SharedError(#[from] SharedError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl BackendError {
    /// Create a new handler error with a status code
    pub fn handler(status: StatusCode, message: impl Into<String>) -> Self {
        Self::HandlerError {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::handler(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::handler(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::handler(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::handler(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::handler(StatusCode::CONFLICT, message)
    }

    /// Create a new state error
    pub fn state(message: impl Into<String>) -> Self {
        Self::StateError {
            message: message.into(),
        }
    }

    /// Create a new upstream error
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::UpstreamError {
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    ///
    /// # Status Code Mapping
    ///
    /// - `HandlerError` - Uses the status code from the error
    /// - `StateError` - 503 Service Unavailable
    /// - `UpstreamError` - 502 Bad Gateway
    /// - `DatabaseError` - 404 for missing rows, 409 for unique violations, else 500
    /// - `TokenError` - 401 Unauthorized
    /// - `HashError`, `SerializationError` - 500 Internal Server Error
    /// - `SharedError` - 400 for validation and decoding problems
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::HandlerError { status, .. } => *status,
            Self::StateError { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::UpstreamError { .. } => StatusCode::BAD_GATEWAY,
            Self::DatabaseError(sqlx::Error::RowNotFound) => StatusCode::NOT_FOUND,
            Self::DatabaseError(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                StatusCode::CONFLICT
            }
            Self::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::TokenError(_) => StatusCode::UNAUTHORIZED,
            Self::HashError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::SharedError(err) => match err {
                SharedError::SerializationError { .. } => StatusCode::BAD_REQUEST,
                SharedError::ValidationError { .. } => StatusCode::BAD_REQUEST,
                SharedError::UnrecognizedMessage { .. } => StatusCode::BAD_REQUEST,
            },
            Self::SerializationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the message returned to the client
    ///
    /// Internal failures are reported generically; details go to the log.
    pub fn message(&self) -> String {
        match self {
            Self::HandlerError { message, .. } => message.clone(),
            Self::StateError { message } => message.clone(),
            Self::UpstreamError { message } => message.clone(),
            Self::DatabaseError(sqlx::Error::RowNotFound) => "Not found".to_string(),
            Self::DatabaseError(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                "Already exists".to_string()
            }
            Self::DatabaseError(_) => "Database error".to_string(),
            Self::TokenError(_) => "Invalid or expired token".to_string(),
            Self::HashError(_) => "Server error".to_string(),
            Self::SharedError(SharedError::ValidationError { message, .. }) => message.clone(),
            Self::SharedError(err) => err.to_string(),
            Self::SerializationError(_) => "Server error".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_error() {
        let error = BackendError::handler(StatusCode::BAD_REQUEST, "Invalid request");
        match error {
            BackendError::HandlerError { status, message } => {
                assert_eq!(status, StatusCode::BAD_REQUEST);
                assert_eq!(message, "Invalid request");
            }
            _ => panic!("Expected HandlerError"),
        }
    }

    #[test]
    fn test_status_code_mapping() {
        assert_eq!(BackendError::unauthorized("no").status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(BackendError::forbidden("no").status_code(), StatusCode::FORBIDDEN);
        assert_eq!(BackendError::conflict("dup").status_code(), StatusCode::CONFLICT);
        assert_eq!(BackendError::state("no db").status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(BackendError::upstream("boom").status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_row_not_found_is_404() {
        let error: BackendError = sqlx::Error::RowNotFound.into();
        assert_eq!(error.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(error.message(), "Not found");
    }

    #[test]
    fn test_other_database_errors_hide_details() {
        let error: BackendError = sqlx::Error::PoolTimedOut.into();
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error.message(), "Database error");
    }

    #[test]
    fn test_from_shared_error() {
        let backend_error: BackendError = SharedError::validation("content", "Too long").into();
        assert_eq!(backend_error.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(backend_error.message(), "Too long");
    }
}
