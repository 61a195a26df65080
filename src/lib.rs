// Increase recursion limit for complex async operations
#![recursion_limit = "256"]

//! storyloom - Collaborative Storytelling Server
//!
//! Writers take turns adding short contributions to shared story chains.
//! Everyone in the same room sees new contributions the moment they are
//! saved, over a WebSocket.
//!
//! # Module Structure
//!
//! - **`shared`** - Types with no server dependencies
//!   - Realtime wire messages (`join-room`, `story-added`, `new-story`, `room-update`)
//!   - Stories, chains and their grouping rules
//!   - The password strength analyzer
//!   - Configuration and shared error types
//!
//! - **`backend`** - Server-side code (only compiled with the `ssr` feature)
//!   - Axum HTTP and WebSocket server
//!   - Room registry and broadcast dispatcher
//!   - SQLite persistence, authentication, moderation
//!
//! # Feature Flags
//!
//! - **`ssr`** (default) - enables `backend` and the server binary
//!
//! # Usage
//!
//! ```rust,no_run
//! use storyloom::backend::server::create_app;
//! use storyloom::shared::AppConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::from_env()?;
//! let addr = config.socket_addr();
//! let app = create_app(config).await?;
//! let listener = tokio::net::TcpListener::bind(addr).await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! - The room registry sits behind one `std::sync::Mutex`, never held across `.await`
//! - Each connection has its own unbounded outbound queue drained by a writer task
//! - Story sequence numbers are assigned inside SQLite, not in process memory

/// Shared types and data structures
pub mod shared;

/// Backend server-side code
#[cfg(feature = "ssr")]
pub mod backend;
