//! Backend Module
//!
//! All server-side code for storyloom: an Axum HTTP and WebSocket server
//! backed by SQLite.
//!
//! This module is only compiled when the `ssr` feature is enabled.
//!
//! # Architecture
//!
//! - **`server`** - Server initialization, application state, database setup
//! - **`routes`** - HTTP route configuration and router assembly
//! - **`realtime`** - Room registry, broadcast dispatcher, `/ws` connections
//! - **`stories`** - Story chains, sequence assignment, hearts
//! - **`rooms`** - Rooms, join codes and live presence
//! - **`themes`** - Writing prompts and the daily theme
//! - **`community`** - Community stats and featured stories
//! - **`auth`** - Accounts, JWT sessions, public profiles
//! - **`admin`** - Account moderation
//! - **`password`** - Password analyzer endpoints and history
//! - **`export`** - Chain export as text, markdown or JSON
//! - **`ai`** - Story continuation through an external model
//! - **`middleware`** - Authentication and role gates
//! - **`error`** - Backend error type and its HTTP mapping
//!
//! # Module Structure
//!
//! ```text
//! backend/
//! ├── mod.rs          - Module exports and documentation
//! ├── main.rs         - Server binary
//! ├── server/         - Initialization, state, database pool
//! ├── routes/         - Route configuration
//! ├── realtime/       - Live rooms over WebSockets
//! ├── stories/        - Story persistence and handlers
//! ├── rooms/          - Room persistence and handlers
//! ├── auth/           - Authentication
//! ├── admin/          - Moderation handlers
//! ├── password/       - Password analyzer
//! ├── middleware/     - Request middleware
//! ├── error/          - Error types
//! ├── themes.rs
//! ├── community.rs
//! ├── export.rs
//! └── ai.rs
//! ```
//!
//! # State Management
//!
//! `AppState` holds the SQLite pool, the broadcast dispatcher (which owns
//! the room registry), the configuration and a shared `reqwest::Client`.
//! Durable data lives in SQLite; room membership is in memory only and is
//! rebuilt as clients reconnect.
//!
//! # Error Handling
//!
//! Handlers return `Result<_, BackendError>`; the error maps itself to a
//! status code and a `{"error", "status"}` JSON body.

/// Server setup and configuration
pub mod server;

/// Route configuration
pub mod routes;

/// Real-time update system
pub mod realtime;

/// Story chains
pub mod stories;

/// Rooms and presence
pub mod rooms;

/// Writing themes
pub mod themes;

/// Community stats and featured stories
pub mod community;

/// Authentication and user management
pub mod auth;

/// Account moderation
pub mod admin;

/// Password analyzer
pub mod password;

/// Chain export
pub mod export;

/// Story continuation
pub mod ai;

/// Middleware for request processing
pub mod middleware;

/// Backend error types
pub mod error;

pub use error::BackendError;
pub use realtime::{BroadcastDispatcher, RoomRegistry};
pub use server::{create_app, AppState};
