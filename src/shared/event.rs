/**
 * Real-time Message Types
 *
 * Frames exchanged over the `/ws` endpoint. Every frame is a JSON object
 * carrying a `type` tag:
 *
 * Client to server:
 * - `join-room` `{ userId, roomId }` - attach this connection to a room
 * - `story-added` `{ story, chainId }` - relay a freshly saved story to the room
 *
 * Server to client:
 * - `new-story` `{ story, chainId }` - a story was added to a chain in your room
 * - `room-update` `{ roomId, memberCount }` - live membership changed
 */
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::shared::error::SharedError;

/// Room key used by clients that are not inside a specific room
pub const GLOBAL_ROOM: &str = "global";

/// Inbound frame from a WebSocket client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientMessage {
    /// Attach the connection to `room_id`, replacing any previous room
    JoinRoom {
        #[serde(rename = "userId")]
        user_id: String,
        #[serde(rename = "roomId")]
        room_id: String,
    },
    /// Relay a story to every member of the sender's room
    StoryAdded {
        story: Value,
        #[serde(rename = "chainId")]
        chain_id: i64,
    },
}

impl ClientMessage {
    /// Decode a text frame
    ///
    /// Distinguishes frames that are not valid JSON or miss required fields
    /// (`SerializationError`) from well-formed frames with a `type` this server
    /// does not handle (`UnrecognizedMessage`). Both are dropped by the caller;
    /// the split only affects what gets logged.
    pub fn parse(text: &str) -> Result<Self, SharedError> {
        let value: Value = serde_json::from_str(text)?;
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        match kind.as_str() {
            "join-room" | "story-added" => Ok(serde_json::from_value(value)?),
            _ => Err(SharedError::unrecognized(kind)),
        }
    }
}

/// Outbound frame pushed to WebSocket clients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerMessage {
    NewStory {
        story: Value,
        #[serde(rename = "chainId")]
        chain_id: i64,
    },
    RoomUpdate {
        #[serde(rename = "roomId")]
        room_id: String,
        #[serde(rename = "memberCount")]
        member_count: usize,
    },
}

impl ServerMessage {
    /// Serialize to the text frame sent on the wire
    pub fn to_frame(&self) -> Result<String, SharedError> {
        Ok(serde_json::to_string(self)?)
    }
}
