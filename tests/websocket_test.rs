//! WebSocket tests over a real socket
//!
//! Serves the full router on an ephemeral port and talks to `/ws` with a
//! `tokio-tungstenite` client, so the split socket, the writer task and the
//! teardown path all run for real.

#![cfg(feature = "ssr")]

mod common;

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use common::TestApp;
use storyloom::backend::realtime::RoomRegistry;

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn serve(app: &TestApp) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = app.router.clone();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

async fn connect(addr: SocketAddr) -> Client {
    let (ws, _) = connect_async(format!("ws://{}/ws", addr)).await.unwrap();
    ws
}

async fn send_json(ws: &mut Client, value: Value) {
    ws.send(Message::Text(value.to_string().into())).await.unwrap();
}

/// Next JSON frame of the given `type`, skipping anything else
async fn next_of_type(ws: &mut Client, kind: &str) -> Value {
    let read = async {
        while let Some(frame) = ws.next().await {
            if let Message::Text(text) = frame.unwrap() {
                let value: Value = serde_json::from_str(text.as_str()).unwrap();
                if value["type"] == kind {
                    return value;
                }
            }
        }
        panic!("socket closed before a {} frame arrived", kind);
    };
    tokio::time::timeout(Duration::from_secs(5), read).await.unwrap()
}

/// Poll until the registry reaches the expected state
async fn eventually(registry: &RoomRegistry, check: impl Fn(&RoomRegistry) -> bool) {
    for _ in 0..500 {
        if check(registry) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("registry never reached the expected state");
}

async fn within<F: Future>(future: F) -> F::Output {
    tokio::time::timeout(Duration::from_secs(5), future).await.unwrap()
}

#[tokio::test]
async fn test_relay_close_and_abrupt_drop() {
    let app = TestApp::new().await;
    let addr = serve(&app).await;
    let registry = app.state.registry();

    let mut a = connect(addr).await;
    let mut b = connect(addr).await;
    send_json(&mut a, json!({"type": "join-room", "userId": "a", "roomId": "R1"})).await;
    send_json(&mut b, json!({"type": "join-room", "userId": "b", "roomId": "R1"})).await;
    eventually(registry, |r| r.member_count("R1") == 2).await;

    let update = next_of_type(&mut b, "room-update").await;
    assert_eq!(update["roomId"], "R1");

    send_json(
        &mut a,
        json!({"type": "story-added", "story": {"id": 3, "content": "A bell rang."}, "chainId": 4}),
    )
    .await;
    let relayed = next_of_type(&mut b, "new-story").await;
    assert_eq!(relayed["chainId"], 4);
    assert_eq!(relayed["story"]["content"], "A bell rang.");
    let echoed = next_of_type(&mut a, "new-story").await;
    assert_eq!(echoed["story"]["id"], 3);

    // Clean close handshake
    within(a.close(None)).await.unwrap();
    eventually(registry, |r| r.member_count("R1") == 1).await;
    let update = next_of_type(&mut b, "room-update").await;
    assert_eq!(update["memberCount"], 1);

    // Connection vanishes without a close frame
    drop(b);
    eventually(registry, |r| r.member_count("R1") == 0 && r.connection_count() == 0).await;
}

#[tokio::test]
async fn test_posted_story_reaches_global_room_socket() {
    let app = TestApp::new().await;
    let addr = serve(&app).await;
    let ada = app.member("ada").await;

    let mut listener = connect(addr).await;
    send_json(&mut listener, json!({"type": "join-room", "userId": "ben", "roomId": "global"})).await;
    eventually(app.state.registry(), |r| r.member_count("global") == 1).await;

    let (status, story) = app
        .post("/api/stories", Some(&ada.token), json!({"content": "The tide went out."}))
        .await;
    assert_eq!(status.as_u16(), 201);

    let frame = next_of_type(&mut listener, "new-story").await;
    assert_eq!(frame["chainId"], story["chainId"]);
    assert_eq!(frame["story"]["id"], story["id"]);
}

#[tokio::test]
async fn test_malformed_frames_keep_the_socket_open() {
    let app = TestApp::new().await;
    let addr = serve(&app).await;

    let mut ws = connect(addr).await;
    ws.send(Message::Text("not json".into())).await.unwrap();
    send_json(&mut ws, json!({"type": "typing"})).await;
    send_json(&mut ws, json!({"type": "join-room", "userId": "c", "roomId": "R7"})).await;

    let update = next_of_type(&mut ws, "room-update").await;
    assert_eq!(update, json!({"type": "room-update", "roomId": "R7", "memberCount": 1}));
}
