/**
 * Router Configuration
 *
 * This module provides the main router creation function that combines
 * all route configurations into a single Axum router.
 *
 * # Route Order
 *
 * 1. Realtime route (`GET /ws` WebSocket upgrade)
 * 2. API routes (`/api/...`)
 * 3. Static files from `STATIC_DIR`, with a JSON 404 when nothing matches
 *
 * Requests are wrapped in a `TraceLayer` span.
 */

use axum::{handler::HandlerWithoutStateExt, routing::get, Router};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::backend::error::BackendError;
use crate::backend::realtime::ws_handler;
use crate::backend::routes::api_routes::configure_api_routes;
use crate::backend::server::state::AppState;

async fn not_found() -> BackendError {
    BackendError::not_found("Not found")
}

/// Create the Axum router with all routes configured
///
/// # Arguments
///
/// * `app_state` - Shared pool, dispatcher, configuration and HTTP client
///
/// # Returns
///
/// Configured Axum Router ready to serve requests
pub fn create_router(app_state: AppState) -> Router<()> {
    let router = Router::new().route("/ws", get(ws_handler));

    let router = configure_api_routes(router, &app_state);

    // Anything else is a static asset or a 404
    let static_files =
        ServeDir::new(&app_state.config.static_dir).not_found_service(not_found.into_service());
    let router = router.fallback_service(static_files);

    router
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
