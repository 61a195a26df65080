/**
 * Broadcast Dispatcher
 *
 * Pushes a server message to every live connection in a room.
 *
 * Delivery is best effort: the frame is serialized once, then queued on each
 * member's channel. Members whose channel is already closed are skipped and
 * nothing is retried or buffered for them. A broadcast never returns an
 * error; the `BroadcastReport` exists for logging and tests.
 */
use crate::backend::realtime::registry::RoomRegistry;
use crate::shared::ServerMessage;

/// Outcome of a single broadcast
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub skipped: usize,
}

/// Sends server messages to room members
#[derive(Clone, Default)]
pub struct BroadcastDispatcher {
    registry: RoomRegistry,
}

impl BroadcastDispatcher {
    pub fn new(registry: RoomRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    /// Send `message` to every open connection in `room_id`
    ///
    /// # Returns
    ///
    /// How many members got the frame queued and how many were skipped.
    /// An empty or unknown room yields an all-zero report.
    pub fn broadcast(&self, room_id: &str, message: &ServerMessage) -> BroadcastReport {
        let members = self.registry.members_of(room_id);
        if members.is_empty() {
            return BroadcastReport::default();
        }

        let frame = match message.to_frame() {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!("[Broadcast] Failed to serialize message for '{}': {}", room_id, e);
                return BroadcastReport::default();
            }
        };

        let mut report = BroadcastReport::default();
        for member in members {
            if member.is_closed() || !member.send(frame.clone()) {
                tracing::debug!("[Broadcast] Skipping closed connection {}", member.id());
                report.skipped += 1;
            } else {
                report.delivered += 1;
            }
        }

        tracing::debug!(
            "[Broadcast] '{}': delivered {}, skipped {}",
            room_id,
            report.delivered,
            report.skipped
        );
        report
    }

    /// Tell everyone in `room_id` how many connections it now has
    pub fn announce_membership(&self, room_id: &str) -> BroadcastReport {
        let message = ServerMessage::RoomUpdate {
            room_id: room_id.to_string(),
            member_count: self.registry.member_count(room_id),
        };
        self.broadcast(room_id, &message)
    }
}
