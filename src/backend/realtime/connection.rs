/**
 * WebSocket Connection Handler
 *
 * Each `/ws` connection gets a `ConnectionSession` that walks through
 *
 * ```text
 * Unjoined --join-room--> Joined(room) --join-room--> Joined(other room)
 *     |                       |
 *     +-------- close --------+--> Closed
 * ```
 *
 * - `join-room` registers the connection under the requested room.
 * - `story-added` is relayed as `new-story` to everyone in the sender's room,
 *   the sender included. Before any join it is logged and dropped.
 * - Anything unparseable or with an unknown `type` is logged and dropped; the
 *   connection stays open.
 * - Closing, for whatever reason, unregisters the connection. Dropping the
 *   session does the same, so an aborted task cannot leave a stale entry.
 *
 * Frames from one socket are handled in order by a single task. Outbound
 * frames go through an unbounded channel drained by a separate pusher task.
 */
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::backend::realtime::broadcast::{BroadcastDispatcher, BroadcastReport};
use crate::backend::realtime::registry::{ConnectionHandle, ConnectionId};
use crate::shared::{ClientMessage, ServerMessage, SharedError};

/// Where a connection is in its lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Unjoined,
    Joined { user_id: String, room_id: String },
    Closed,
}

/// What handling one inbound frame did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    Joined { room_id: String },
    Relayed(BroadcastReport),
    Dropped(DropReason),
}

/// Why a frame was ignored
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    Malformed,
    Unrecognized(String),
    NotJoined,
    Closed,
}

/// Per-connection state machine
pub struct ConnectionSession {
    handle: ConnectionHandle,
    dispatcher: BroadcastDispatcher,
    state: SessionState,
}

impl ConnectionSession {
    pub fn new(handle: ConnectionHandle, dispatcher: BroadcastDispatcher) -> Self {
        Self {
            handle,
            dispatcher,
            state: SessionState::Unjoined,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.handle.id()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Handle one inbound text frame
    pub fn handle_text(&mut self, text: &str) -> FrameOutcome {
        if self.state == SessionState::Closed {
            return FrameOutcome::Dropped(DropReason::Closed);
        }

        match ClientMessage::parse(text) {
            Ok(ClientMessage::JoinRoom { user_id, room_id }) => self.join(user_id, room_id),
            Ok(ClientMessage::StoryAdded { story, chain_id }) => self.relay(story, chain_id),
            Err(SharedError::UnrecognizedMessage { kind }) => {
                tracing::warn!("[WS] {} sent unrecognized message type '{}'", self.id(), kind);
                FrameOutcome::Dropped(DropReason::Unrecognized(kind))
            }
            Err(e) => {
                tracing::warn!("[WS] {} sent malformed frame: {}", self.id(), e);
                FrameOutcome::Dropped(DropReason::Malformed)
            }
        }
    }

    fn join(&mut self, user_id: String, room_id: String) -> FrameOutcome {
        let outcome = self
            .dispatcher
            .registry()
            .register(self.handle.clone(), &room_id);
        tracing::info!("[WS] {} (user {}) joined room '{}'", self.id(), user_id, room_id);

        if let Some(previous) = &outcome.previous_room {
            self.dispatcher.announce_membership(previous);
        }
        self.dispatcher.announce_membership(&room_id);

        self.state = SessionState::Joined {
            user_id,
            room_id: room_id.clone(),
        };
        FrameOutcome::Joined { room_id }
    }

    fn relay(&self, story: serde_json::Value, chain_id: i64) -> FrameOutcome {
        let SessionState::Joined { room_id, .. } = &self.state else {
            tracing::warn!("[WS] {} sent story-added before joining a room", self.id());
            return FrameOutcome::Dropped(DropReason::NotJoined);
        };

        let report = self
            .dispatcher
            .broadcast(room_id, &ServerMessage::NewStory { story, chain_id });
        FrameOutcome::Relayed(report)
    }

    /// Unregister and move to `Closed`; safe to call more than once
    pub fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        self.state = SessionState::Closed;
        if let Some(room_id) = self.dispatcher.registry().unregister(self.id()) {
            self.dispatcher.announce_membership(&room_id);
        }
        tracing::debug!("[WS] {} closed", self.id());
    }
}

impl Drop for ConnectionSession {
    fn drop(&mut self) {
        self.close();
    }
}

/// `GET /ws` upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(dispatcher): State<BroadcastDispatcher>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, dispatcher))
}

/// Drive one upgraded socket until either side goes away
pub async fn handle_socket(socket: WebSocket, dispatcher: BroadcastDispatcher) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let mut session = ConnectionSession::new(ConnectionHandle::new(tx), dispatcher);
    let id = session.id();
    tracing::info!("[WS] {} connected", id);

    // Pusher: drain queued frames into the socket
    let mut send_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if sink.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(frame) = stream.next().await {
            match frame {
                Ok(Message::Text(text)) => {
                    session.handle_text(text.as_str());
                }
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!("[WS] {} receive error: {}", session.id(), e);
                    break;
                }
            }
        }
        session.close();
    });

    tokio::select! {
        _ = &mut send_task => {
            recv_task.abort();
            // Wait for the abort so the session is dropped, and unregistered, before we return
            let _ = recv_task.await;
        }
        _ = &mut recv_task => {
            send_task.abort();
        }
    }

    tracing::info!("[WS] {} disconnected", id);
}
