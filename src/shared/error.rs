//! Shared Error Types
//!
//! This module defines error types that are shared between the HTTP API and the
//! real-time layer. These errors represent common failure cases that can occur
//! when decoding client input or validating request payloads.
//!
//! # Error Categories
//!
//! - `SerializationError` - JSON serialization/deserialization failures
//! - `ValidationError` - Data validation failures
//! - `UnrecognizedMessage` - A well-formed WebSocket frame with an unknown `type`
//!
//! # Usage
//!
//! ```rust
//! use storyloom::shared::error::SharedError;
//!
//! // Create a validation error
//! let error = SharedError::validation("content", "Story content cannot be empty");
//! ```
use thiserror::Error;

/// Shared error types that can occur anywhere input is decoded
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SharedError {
    /// JSON serialization or deserialization error
    #[error("Serialization error: {message}")]
    SerializationError {
        /// Human-readable error message
        message: String,
    },

    /// Data validation error
    #[error("Validation error in field '{field}': {message}")]
    ValidationError {
        /// The field that failed validation
        field: String,
        /// Human-readable error message
        message: String,
    },

    /// Inbound real-time message whose `type` is not one we handle
    #[error("Unrecognized message type: {kind}")]
    UnrecognizedMessage {
        /// The `type` tag that was received (empty when missing)
        kind: String,
    },
}

impl SharedError {
    /// Create a new serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::SerializationError {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new unrecognized-message error
    pub fn unrecognized(kind: impl Into<String>) -> Self {
        Self::UnrecognizedMessage { kind: kind.into() }
    }
}

impl From<serde_json::Error> for SharedError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(format!("JSON error: {}", err))
    }
}
