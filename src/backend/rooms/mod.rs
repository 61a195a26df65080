//! Rooms
//!
//! - **`db`** - room rows and join codes
//! - **`handlers`** - `/api/rooms` endpoints and live presence

pub mod db;

pub mod handlers;

pub use db::Room;
pub use handlers::{create_room, get_room, get_room_by_code, list_public_rooms, room_presence};
