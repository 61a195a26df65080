//! Route Configuration Module
//!
//! This module configures all HTTP routes for the backend server.
//!
//! ```text
//! routes/
//! ├── mod.rs          - Module exports
//! ├── router.rs       - Main router creation, /ws, static files, fallback
//! └── api_routes.rs   - /api endpoints grouped by required role
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use storyloom::backend::routes::create_router;
//! use storyloom::backend::server::state::AppState;
//!
//! let router = create_router(AppState::new(config, pool));
//! ```

/// Main router creation
pub mod router;

/// API endpoint handlers
pub mod api_routes;

pub use router::create_router;
