//! Real-time Update Module
//!
//! Live room membership and story notifications over WebSockets.
//!
//! # Architecture
//!
//! - **`registry`** - room id to live connections, one lock around all of it
//! - **`broadcast`** - best-effort fan-out of a server message to a room
//! - **`connection`** - per-socket state machine and the `/ws` upgrade handler
//!
//! # Module Structure
//!
//! ```text
//! realtime/
//! ├── mod.rs          - Module exports and documentation
//! ├── registry.rs     - RoomRegistry, ConnectionHandle
//! ├── broadcast.rs    - BroadcastDispatcher
//! └── connection.rs   - ConnectionSession, ws_handler
//! ```
//!
//! # Delivery
//!
//! Broadcasts are fire-and-forget. There is no acknowledgement, no replay
//! and no resume after reconnect: a client that misses a `new-story` frame
//! recovers by re-fetching the chain over HTTP.

pub mod broadcast;
pub mod connection;
pub mod registry;

pub use broadcast::{BroadcastDispatcher, BroadcastReport};
pub use connection::{ws_handler, ConnectionSession, SessionState};
pub use registry::{ConnectionHandle, ConnectionId, RoomRegistry};
