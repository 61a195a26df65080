//! HTTP API integration tests
//!
//! Each test builds the full router over a private in-memory database and
//! drives it with `oneshot` requests.

#![cfg(feature = "ssr")]

mod common;

use axum::http::{Method, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tokio::sync::mpsc;

use common::{TestApp, TEST_PASSWORD};
use storyloom::backend::auth::users::{UserRole, UserStatus};
use storyloom::backend::realtime::ConnectionHandle;

#[tokio::test]
async fn test_registration_requires_approval() {
    let app = TestApp::new().await;
    let admin = app.admin("root").await;

    let (status, body) = app
        .post(
            "/api/auth/register",
            None,
            json!({"username": "quill", "email": "quill@example.com", "password": "inkwell"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["status"], "pending");
    assert_eq!(body["user"]["role"], "community");
    assert!(body["user"].get("passwordHash").is_none());
    let user_id = body["user"]["id"].as_str().unwrap().to_string();

    let login = json!({"email": "quill@example.com", "password": "inkwell"});
    let (status, _) = app.post("/api/auth/login", None, login.clone()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .post(&format!("/api/admin/users/{}/approve", user_id), Some(&admin.token), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["status"], "approved");

    let (status, body) = app.post("/api/auth/login", None, login).await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap();

    let (status, me) = app.request(Method::GET, "/api/auth/me", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["username"], "quill");
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let app = TestApp::new().await;
    app.member("quill").await;

    let (status, body) = app
        .post(
            "/api/auth/register",
            None,
            json!({"username": "QUILL", "email": "other@example.com", "password": "inkwell"}),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["status"], 409);

    let (status, _) = app
        .post(
            "/api/auth/register",
            None,
            json!({"username": "ok", "email": "bad", "password": "1"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_admin_only_once() {
    let app = TestApp::new().await;
    let request = json!({"username": "first", "email": "first@example.com", "password": "secret1"});

    let (status, body) = app.post("/api/auth/create-admin", None, request).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["role"], "admin");
    assert_eq!(body["user"]["status"], "approved");

    let again = json!({"username": "second", "email": "second@example.com", "password": "secret2"});
    let (status, _) = app.post("/api/auth/create-admin", None, again).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_suspended_account_token_stops_working() {
    let app = TestApp::new().await;
    let admin = app.admin("root").await;
    let writer = app.member("writer").await;

    let (status, _) = app.request(Method::GET, "/api/auth/me", Some(&writer.token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .post(&format!("/api/admin/users/{}/suspend", writer.user.id), Some(&admin.token), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.request(Method::GET, "/api/auth/me", Some(&writer.token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .post(
            "/api/auth/login",
            None,
            json!({"email": "writer@example.com", "password": TEST_PASSWORD}),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_role_gates() {
    let app = TestApp::new().await;
    let member = app.member("member").await;
    let moderator = app.user("mod", UserRole::Moderator, UserStatus::Approved).await;

    let (status, _) = app.get("/api/admin/users").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app.request(Method::GET, "/api/admin/users", Some(&member.token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.request(Method::GET, "/api/admin/users", Some(&moderator.token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .request(Method::GET, "/api/auth/me", Some("not-a-token"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Moderators may feature stories
    let (_, story) = app
        .post("/api/stories", Some(&member.token), json!({"content": "Fog rolled in."}))
        .await;
    let (status, pick) = app
        .post(
            "/api/admin/featured",
            Some(&moderator.token),
            json!({"storyId": story["id"], "note": "Atmospheric"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(pick["story"]["content"], "Fog rolled in.");

    let (status, _) = app
        .post("/api/admin/featured", Some(&member.token), json!({"storyId": story["id"]}))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, picks) = app.get("/api/community/cookies-picks").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(picks.as_array().unwrap().len(), 1);
    assert_eq!(picks[0]["note"], "Atmospheric");
}

#[tokio::test]
async fn test_admin_user_management() {
    let app = TestApp::new().await;
    let admin = app.admin("root").await;
    let writer = app.member("writer").await;

    let (status, users) = app.request(Method::GET, "/api/admin/users", Some(&admin.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users.as_array().unwrap().len(), 2);

    let (status, body) = app
        .request(
            Method::PATCH,
            &format!("/api/admin/users/{}/role", writer.user.id),
            Some(&admin.token),
            Some(json!({"role": "moderator"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["role"], "moderator");

    let (status, _) = app
        .request(
            Method::PATCH,
            &format!("/api/admin/users/{}/role", writer.user.id),
            Some(&admin.token),
            Some(json!({"role": "overlord"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .request(
            Method::DELETE,
            &format!("/api/admin/users/{}", admin.user.id),
            Some(&admin.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post(&format!("/api/admin/users/{}/delete", writer.user.id), Some(&admin.token), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .request(
            Method::DELETE,
            &format!("/api/admin/users/{}", writer.user.id),
            Some(&admin.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_story_chain_flow() {
    let app = TestApp::new().await;
    let ada = app.member("ada").await;
    let ben = app.member("ben").await;

    let (status, _) = app.post("/api/stories", None, json!({"content": "Hello"})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, first) = app
        .post("/api/stories", Some(&ada.token), json!({"content": "  The map was blank.  "}))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["content"], "The map was blank.");
    assert_eq!(first["authorName"], "ada");
    assert_eq!(first["sequence"], 1);
    let chain_id = first["chainId"].as_i64().unwrap();

    let (status, second) = app
        .post(
            "/api/stories",
            Some(&ben.token),
            json!({"chainId": chain_id, "content": "Until it started drawing itself."}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(second["sequence"], 2);

    let (status, chain) = app.get(&format!("/api/stories/chain/{}", chain_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(chain["contributorCount"], 2);
    let sequences: Vec<i64> = chain["stories"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["sequence"].as_i64().unwrap())
        .collect();
    assert_eq!(sequences, vec![1, 2]);

    let (status, chains) = app.get("/api/stories/chains?limit=5&roomId=global").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(chains.as_array().unwrap().len(), 1);

    let (status, _) = app
        .post(
            "/api/stories",
            Some(&ben.token),
            json!({"chainId": i64::MAX, "content": "Off the end of the map."}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, next) = app.get("/api/stories/next-chain-id").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(next["chainId"], chain_id + 1);

    let heart_uri = format!("/api/stories/{}/heart", first["id"]);
    let (status, heart) = app.post(&heart_uri, Some(&ben.token), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(heart, json!({"hearted": true, "hearts": 1}));
    let (_, heart) = app.post(&heart_uri, Some(&ben.token), json!({})).await;
    assert_eq!(heart, json!({"hearted": false, "hearts": 0}));

    let (status, _) = app.post("/api/stories/9999/heart", Some(&ben.token), json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.get("/api/stories/chain/9999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .post("/api/stories", Some(&ada.token), json!({"content": "x".repeat(501)}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, profile) = app.get(&format!("/api/users/{}", ada.user.id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["storyCount"], 1);
    assert!(profile.get("email").is_none());
}

#[tokio::test]
async fn test_new_story_is_broadcast_to_its_room() {
    let app = TestApp::new().await;
    let ada = app.member("ada").await;

    let (_, room) = app
        .post("/api/rooms", Some(&ada.token), json!({"name": "Harbour"}))
        .await;
    let room_id = room["id"].as_str().unwrap().to_string();

    let (room_tx, mut room_rx) = mpsc::unbounded_channel();
    let (global_tx, mut global_rx) = mpsc::unbounded_channel();
    app.state.registry().register(ConnectionHandle::new(room_tx), &room_id);
    app.state.registry().register(ConnectionHandle::new(global_tx), "global");

    let (status, story) = app
        .post(
            "/api/stories",
            Some(&ada.token),
            json!({"roomId": room_id, "content": "Gulls circled the mast."}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let frame: Value = serde_json::from_str(&room_rx.try_recv().unwrap()).unwrap();
    assert_eq!(frame["type"], "new-story");
    assert_eq!(frame["chainId"], story["chainId"]);
    assert_eq!(frame["story"]["content"], "Gulls circled the mast.");
    assert!(global_rx.try_recv().is_err());

    let (status, presence) = app.get(&format!("/api/rooms/{}/presence", room_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(presence["memberCount"], 1);
}

#[tokio::test]
async fn test_rooms() {
    let app = TestApp::new().await;
    let ada = app.member("ada").await;

    let (status, room) = app
        .post(
            "/api/rooms",
            Some(&ada.token),
            json!({"name": "Night Train", "prompt": "The conductor had no face."}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let code = room["code"].as_str().unwrap();
    assert_eq!(code.len(), 6);
    assert_eq!(room["memberCount"], 0);

    let (status, found) = app.get(&format!("/api/rooms/code/{}", code.to_lowercase())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found["id"], room["id"]);

    let (status, _) = app
        .post(
            "/api/rooms",
            Some(&ada.token),
            json!({"name": "Secret", "isPrivate": true}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, public) = app.get("/api/rooms/public").await;
    let names: Vec<&str> = public
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Night Train"]);

    let (status, _) = app.get("/api/rooms/code/NOPE00").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .post(
            "/api/stories",
            Some(&ada.token),
            json!({"roomId": uuid::Uuid::new_v4(), "content": "Lost"}),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_public_pages() {
    let app = TestApp::new().await;

    let (status, themes) = app.get("/api/themes").await;
    assert_eq!(status, StatusCode::OK);
    assert!(!themes.as_array().unwrap().is_empty());

    let (status, daily) = app.get("/api/themes/daily").await;
    assert_eq!(status, StatusCode::OK);
    assert!(daily["title"].is_string());

    let (status, stats) = app.get("/api/community/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        stats,
        json!({"totalStories": 0, "activeUsers": 0, "totalHearts": 0, "dailyContributions": 0})
    );
}

#[tokio::test]
async fn test_password_endpoints() {
    let app = TestApp::new().await;

    let (status, body) = app.post("/api/check-password", None, json!({"password": ""})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"empty": true}));

    let (_, body) = app.post("/api/check-password", None, json!({"password": "password"})).await;
    assert_eq!(body["details"]["hasCommonPatterns"], true);

    let (status, _) = app
        .post("/api/password-history", None, json!({"password": "Sturdy#Lamp42"}))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app.get("/api/password-history").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let ada = app.member("ada").await;
    let token = Some(ada.token.as_str());
    let (status, saved) = app
        .post("/api/password-history", token, json!({"password": "Sturdy#Lamp42"}))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(saved.get("password").is_none());
    assert!(saved.get("passwordHash").is_none());

    let (status, history) = app
        .request(Method::GET, "/api/password-history?limit=5", token, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["id"], saved["id"]);

    let uri = format!("/api/password-history/{}", saved["id"].as_str().unwrap());
    let (status, _) = app.request(Method::DELETE, &uri, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app.request(Method::DELETE, &uri, token, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.request(Method::DELETE, &uri, token, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.post("/api/password-history", token, json!({"password": ""})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_export_and_assistant() {
    let app = TestApp::new().await;
    let ada = app.member("ada").await;
    let (_, story) = app
        .post("/api/stories", Some(&ada.token), json!({"content": "Rain, again."}))
        .await;
    let chain_id = story["chainId"].as_i64().unwrap();

    let (status, json_export) = app.get(&format!("/api/export/chain/{}?format=json", chain_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_export["chainId"], chain_id);

    let (status, _) = app.get(&format!("/api/export/chain/{}?format=markdown", chain_id)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.get(&format!("/api/export/chain/{}?format=pdf", chain_id)).await;
    assert_eq!(status, StatusCode::NOT_IMPLEMENTED);

    let (status, _) = app.get("/api/export/chain/404?format=text").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // No provider configured in tests
    let (status, _) = app
        .post("/api/ai/continue-story", None, json!({"context": "Rain, again."}))
        .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let app = TestApp::new().await;
    let (status, body) = app.get("/api/nothing-here").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], 404);
    assert!(body["error"].is_string());
}
