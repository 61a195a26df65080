//! Server Module
//!
//! Application state, database setup and app assembly.
//!
//! ```text
//! server/
//! ├── mod.rs    - Module exports
//! ├── state.rs  - AppState and FromRef impls
//! ├── config.rs - SQLite pool and migrations
//! └── init.rs   - create_app
//! ```

pub mod state;

pub mod config;

pub mod init;

pub use init::create_app;
pub use state::AppState;
