/**
 * Application State Management
 *
 * This module defines the application state structure and implements
 * the necessary `FromRef` traits for Axum state extraction.
 *
 * # Architecture
 *
 * `AppState` holds:
 * - the SQLite connection pool (durable data)
 * - the broadcast dispatcher, which owns the in-memory room registry
 * - the validated configuration
 * - a shared HTTP client for the story-continuation provider
 *
 * Every field is cheap to clone; clones share the same underlying state.
 *
 * # State Extraction
 *
 * Handlers that only need one piece can extract it directly:
 *
 * ```rust,ignore
 * async fn handler(State(pool): State<SqlitePool>) { /* ... */ }
 * async fn ws(State(dispatcher): State<BroadcastDispatcher>) { /* ... */ }
 * ```
 */

use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::SqlitePool;

use crate::backend::realtime::{BroadcastDispatcher, RoomRegistry};
use crate::shared::AppConfig;

/// Central state container for the Axum application
#[derive(Clone)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub dispatcher: BroadcastDispatcher,
    pub config: Arc<AppConfig>,
    pub http_client: reqwest::Client,
}

impl AppState {
    pub fn new(config: AppConfig, db_pool: SqlitePool) -> Self {
        Self {
            db_pool,
            dispatcher: BroadcastDispatcher::new(RoomRegistry::new()),
            config: Arc::new(config),
            http_client: reqwest::Client::new(),
        }
    }

    pub fn registry(&self) -> &RoomRegistry {
        self.dispatcher.registry()
    }
}

impl FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> Self {
        state.db_pool.clone()
    }
}

impl FromRef<AppState> for BroadcastDispatcher {
    fn from_ref(state: &AppState) -> Self {
        state.dispatcher.clone()
    }
}

impl FromRef<AppState> for RoomRegistry {
    fn from_ref(state: &AppState) -> Self {
        state.dispatcher.registry().clone()
    }
}

impl FromRef<AppState> for Arc<AppConfig> {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
