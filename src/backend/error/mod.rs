//! Backend Error Module
//!
//! Error types returned by HTTP handlers and their conversion into JSON
//! responses.
//!
//! # Module Structure
//!
//! ```text
//! error/
//! ├── mod.rs        - Module exports and documentation
//! ├── types.rs      - BackendError and its status mapping
//! └── conversion.rs - IntoResponse implementation
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use storyloom::backend::error::BackendError;
//! use axum::Json;
//!
//! async fn handler() -> Result<Json<()>, BackendError> {
//!     Err(BackendError::bad_request("Missing field"))
//! }
//! ```

/// Error type definitions
pub mod types;

/// Error conversion implementations
pub mod conversion;

pub use types::BackendError;

/// Result alias used by handlers and persistence helpers
pub type BackendResult<T> = Result<T, BackendError>;
