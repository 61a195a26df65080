/**
 * Room Registry
 *
 * In-process index of which live WebSocket connections are in which room.
 * Nothing here is persisted; the registry starts empty on every boot.
 *
 * # Invariants
 *
 * - A connection belongs to at most one room. Joining a second room detaches
 *   it from the first before inserting it into the new one.
 * - Rooms with no members are removed.
 * - `register`, `unregister` and `members_of` all take the same lock, so a
 *   snapshot returned by `members_of` reflects every mutation that completed
 *   before it.
 *
 * The lock is a `std::sync::Mutex`; no `.await` ever happens while it is held.
 */
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use uuid::Uuid;

/// Identifier of one WebSocket connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outbound side of a connection
///
/// Frames pushed here are written to the socket by the connection's pusher
/// task. Cloning is cheap; every clone targets the same socket.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    sender: mpsc::UnboundedSender<String>,
}

impl ConnectionHandle {
    pub fn new(sender: mpsc::UnboundedSender<String>) -> Self {
        Self {
            id: ConnectionId::new(),
            sender,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// True once the pusher task has gone away
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Queue a frame; returns false when the connection is already gone
    pub fn send(&self, frame: String) -> bool {
        self.sender.send(frame).is_ok()
    }
}

/// What a `register` call changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOutcome {
    /// Room the connection was in before, if it was somewhere else
    pub previous_room: Option<String>,
    /// Members of the target room after the join
    pub member_count: usize,
}

#[derive(Default)]
struct RegistryInner {
    rooms: HashMap<String, HashMap<ConnectionId, ConnectionHandle>>,
    membership: HashMap<ConnectionId, String>,
}

impl RegistryInner {
    /// Take `id` out of its room, pruning the room if it empties
    fn detach(&mut self, id: ConnectionId) -> Option<String> {
        let room_id = self.membership.remove(&id)?;
        if let Some(members) = self.rooms.get_mut(&room_id) {
            members.remove(&id);
            if members.is_empty() {
                self.rooms.remove(&room_id);
            }
        }
        Some(room_id)
    }
}

/// Shared map of room id to live connections
#[derive(Clone, Default)]
pub struct RoomRegistry {
    inner: Arc<Mutex<RegistryInner>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while the lock was held cannot leave the maps half-updated in a
    // way later calls can't handle, so a poisoned lock is simply taken over.
    fn lock(&self) -> MutexGuard<'_, RegistryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Put a connection into `room_id`, leaving whatever room it was in
    ///
    /// Joining the room the connection is already in is a no-op apart from
    /// refreshing the stored handle.
    pub fn register(&self, handle: ConnectionHandle, room_id: &str) -> JoinOutcome {
        let mut inner = self.lock();
        let id = handle.id();

        let current = inner.membership.get(&id).cloned();
        let previous_room = match current {
            Some(current) if current == room_id => None,
            Some(_) => inner.detach(id),
            None => None,
        };

        inner.membership.insert(id, room_id.to_string());
        let members = inner.rooms.entry(room_id.to_string()).or_default();
        members.insert(id, handle);
        let member_count = members.len();

        tracing::debug!(
            "[Registry] {} joined '{}' ({} members, left {:?})",
            id,
            room_id,
            member_count,
            previous_room
        );

        JoinOutcome {
            previous_room,
            member_count,
        }
    }

    /// Remove a connection from whatever room holds it
    ///
    /// Returns the room it left, or `None` if it was not registered.
    pub fn unregister(&self, id: ConnectionId) -> Option<String> {
        let left = self.lock().detach(id);
        if let Some(room_id) = &left {
            tracing::debug!("[Registry] {} left '{}'", id, room_id);
        }
        left
    }

    /// Snapshot of the connections currently in `room_id`
    pub fn members_of(&self, room_id: &str) -> Vec<ConnectionHandle> {
        self.lock()
            .rooms
            .get(room_id)
            .map(|members| members.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn member_count(&self, room_id: &str) -> usize {
        self.lock().rooms.get(room_id).map_or(0, HashMap::len)
    }

    pub fn room_of(&self, id: ConnectionId) -> Option<String> {
        self.lock().membership.get(&id).cloned()
    }

    /// Number of rooms with at least one member
    pub fn room_count(&self) -> usize {
        self.lock().rooms.len()
    }

    /// Total number of registered connections
    pub fn connection_count(&self) -> usize {
        self.lock().membership.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle() -> (ConnectionHandle, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ConnectionHandle::new(tx), rx)
    }

    #[test]
    fn test_register_and_members_of() {
        let registry = RoomRegistry::new();
        let (a, _ra) = handle();
        let (b, _rb) = handle();

        let outcome = registry.register(a.clone(), "R1");
        assert_eq!(outcome, JoinOutcome { previous_room: None, member_count: 1 });
        registry.register(b.clone(), "R1");

        let mut ids: Vec<_> = registry.members_of("R1").iter().map(|h| h.id()).collect();
        ids.sort_by_key(|id| id.to_string());
        let mut expected = vec![a.id(), b.id()];
        expected.sort_by_key(|id| id.to_string());
        assert_eq!(ids, expected);
    }

    #[test]
    fn test_rejoin_moves_connection() {
        let registry = RoomRegistry::new();
        let (a, _ra) = handle();

        registry.register(a.clone(), "R1");
        let outcome = registry.register(a.clone(), "R2");

        assert_eq!(outcome.previous_room.as_deref(), Some("R1"));
        assert!(registry.members_of("R1").is_empty());
        assert_eq!(registry.member_count("R2"), 1);
        assert_eq!(registry.room_of(a.id()).as_deref(), Some("R2"));
        // R1 was pruned
        assert_eq!(registry.room_count(), 1);
    }

    #[test]
    fn test_register_same_room_is_idempotent() {
        let registry = RoomRegistry::new();
        let (a, _ra) = handle();

        registry.register(a.clone(), "R1");
        let outcome = registry.register(a.clone(), "R1");

        assert_eq!(outcome, JoinOutcome { previous_room: None, member_count: 1 });
        assert_eq!(registry.connection_count(), 1);
    }

    #[test]
    fn test_unregister() {
        let registry = RoomRegistry::new();
        let (a, _ra) = handle();
        let (b, _rb) = handle();
        registry.register(a.clone(), "R1");
        registry.register(b.clone(), "R1");

        assert_eq!(registry.unregister(a.id()).as_deref(), Some("R1"));
        assert_eq!(registry.member_count("R1"), 1);
        assert!(registry.room_of(a.id()).is_none());

        registry.unregister(b.id());
        assert_eq!(registry.room_count(), 0);
    }

    #[test]
    fn test_unregister_unknown_is_noop() {
        let registry = RoomRegistry::new();
        assert!(registry.unregister(ConnectionId::new()).is_none());
        assert!(registry.members_of("nowhere").is_empty());
    }

    #[test]
    fn test_clones_share_state() {
        let registry = RoomRegistry::new();
        let other = registry.clone();
        let (a, _ra) = handle();
        registry.register(a, "R1");
        assert_eq!(other.member_count("R1"), 1);
    }

    #[test]
    fn test_handle_closed_after_receiver_dropped() {
        let (a, ra) = handle();
        assert!(!a.is_closed());
        drop(ra);
        assert!(a.is_closed());
        assert!(!a.send("x".to_string()));
    }
}
