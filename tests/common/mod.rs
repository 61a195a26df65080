//! Common test utilities and helpers
//!
//! - an app backed by a private in-memory database
//! - account fixtures with ready-made bearer tokens
//! - request/response helpers around `tower::ServiceExt::oneshot`

#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use storyloom::backend::auth::sessions::create_token;
use storyloom::backend::auth::users::{create_user, User, UserRole, UserStatus};
use storyloom::backend::routes::create_router;
use storyloom::backend::server::config::in_memory_database;
use storyloom::backend::server::state::AppState;
use storyloom::shared::AppConfig;

pub const TEST_SECRET: &str = "integration-test-secret";
pub const TEST_PASSWORD: &str = "hunter22";

/// Router plus the state behind it, so tests can inspect the registry and pool
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

/// A stored account and a token for it
pub struct TestUser {
    pub user: User,
    pub token: String,
}

impl TestApp {
    pub async fn new() -> Self {
        let config = AppConfig::builder()
            .jwt_secret(TEST_SECRET)
            .bcrypt_cost(4)
            .static_dir("does-not-exist")
            .build()
            .expect("test config");
        let pool = in_memory_database().await.expect("in-memory database");
        let state = AppState::new(config, pool);
        Self {
            router: create_router(state.clone()),
            state,
        }
    }

    /// Insert an account directly, bypassing registration
    pub async fn user(&self, username: &str, role: UserRole, status: UserStatus) -> TestUser {
        let hash = bcrypt::hash(TEST_PASSWORD, 4).expect("hash");
        let user = create_user(
            &self.state.db_pool,
            username,
            &format!("{}@example.com", username),
            &hash,
            role,
            status,
        )
        .await
        .expect("create user");
        let token = create_token(&user, TEST_SECRET, 1).expect("token");
        TestUser { user, token }
    }

    pub async fn member(&self, username: &str) -> TestUser {
        self.user(username, UserRole::Community, UserStatus::Approved).await
    }

    pub async fn admin(&self, username: &str) -> TestUser {
        self.user(username, UserRole::Admin, UserStatus::Approved).await
    }

    /// Send a request and return the status and the decoded JSON body
    ///
    /// Empty or non-JSON bodies come back as `Value::Null`.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        let response = self.router.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, token, Some(body)).await
    }
}
