//! Middleware Module
//!
//! HTTP middleware for the backend server.
//!
//! - **`auth`** - bearer-token authentication and role gates
//!
//! # Example
//!
//! ```rust,ignore
//! use axum::middleware::from_fn_with_state;
//! use storyloom::backend::middleware::auth_middleware;
//!
//! let protected = Router::new()
//!     .route("/api/stories", post(create_story))
//!     .route_layer(from_fn_with_state(state.clone(), auth_middleware));
//! ```

pub mod auth;

pub use auth::{
    auth_middleware, authenticate, bearer_token, require_admin, require_moderator, AuthUser,
    AuthenticatedUser,
};
