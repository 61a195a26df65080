//! Shared Module
//!
//! Types that do not depend on the server runtime: wire formats for the
//! real-time channel, story and chain models, the password analyzer,
//! configuration and shared error types.

/// Real-time message types for the `/ws` channel
pub mod event;

/// Shared error types
pub mod error;

/// Story and chain models
pub mod story;

/// Password strength analysis
pub mod password;

/// Application configuration
pub mod config;

/// Re-export commonly used types for convenience
pub use event::{ClientMessage, ServerMessage, GLOBAL_ROOM};
pub use error::SharedError;
pub use story::{assemble_chains, NewStoryRequest, Story, StoryChain};
pub use password::{analyze_password, PasswordAnalysis, Strength};
pub use config::{AiConfig, AppConfig, AppConfigBuilder, ConfigError};
