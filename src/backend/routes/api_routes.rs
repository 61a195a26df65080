/**
 * API Route Handlers
 *
 * Routes are grouped by who may call them. Each protected group gets its
 * middleware through `route_layer`, so the checks only run for routes that
 * matched and unknown paths still fall through to the fallback.
 *
 * ## Public
 * - `POST /api/auth/register`, `POST /api/auth/login`, `POST /api/auth/create-admin`
 * - `GET /api/users/{id}`, `GET /api/users/{id}/stories`
 * - `GET /api/rooms/public`, `GET /api/rooms/code/{code}`, `GET /api/rooms/{id}`,
 *   `GET /api/rooms/{id}/presence`
 * - `GET /api/stories/chains`, `GET /api/stories/chain/{chain_id}`,
 *   `GET /api/stories/next-chain-id`
 * - `GET /api/themes`, `GET /api/themes/daily`
 * - `GET /api/community/stats`, `GET /api/community/cookies-picks`
 * - `POST /api/check-password`
 * - `GET /api/export/chain/{chain_id}`
 * - `POST /api/ai/continue-story`
 *
 * ## Signed in
 * - `GET /api/auth/me`, `POST /api/rooms`, `POST /api/stories`,
 *   `POST /api/stories/{id}/heart`
 * - `GET|POST /api/password-history`, `DELETE /api/password-history/{id}`
 *
 * ## Moderator
 * - `POST /api/admin/featured`
 *
 * ## Admin
 * - `GET /api/admin/users`, `POST /api/admin/users/{id}/approve|reject|suspend|delete`,
 *   `DELETE /api/admin/users/{id}`, `PATCH /api/admin/users/{id}/role`
 */

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, patch, post},
    Router,
};

use crate::backend::admin;
use crate::backend::ai::continue_story;
use crate::backend::auth::{create_admin, get_me, get_profile, get_user_stories, login, register};
use crate::backend::community::{feature_story, get_featured, get_stats};
use crate::backend::export::export_chain;
use crate::backend::middleware::{auth_middleware, require_admin, require_moderator};
use crate::backend::password;
use crate::backend::rooms;
use crate::backend::server::state::AppState;
use crate::backend::stories;
use crate::backend::themes::{get_daily_theme, get_themes};

/// Add every `/api` route to `router`
pub fn configure_api_routes(router: Router<AppState>, app_state: &AppState) -> Router<AppState> {
    router
        .merge(public_routes())
        .merge(member_routes(app_state))
        .merge(moderator_routes(app_state))
        .merge(admin_routes(app_state))
}

fn public_routes() -> Router<AppState> {
    Router::new()
        // Accounts
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/create-admin", post(create_admin))
        .route("/api/users/{id}", get(get_profile))
        .route("/api/users/{id}/stories", get(get_user_stories))
        // Rooms
        .route("/api/rooms/public", get(rooms::list_public_rooms))
        .route("/api/rooms/code/{code}", get(rooms::get_room_by_code))
        .route("/api/rooms/{id}", get(rooms::get_room))
        .route("/api/rooms/{id}/presence", get(rooms::room_presence))
        // Stories
        .route("/api/stories/chains", get(stories::list_chains))
        .route("/api/stories/chain/{chain_id}", get(stories::get_chain))
        .route("/api/stories/next-chain-id", get(stories::next_chain_id))
        // Themes and community
        .route("/api/themes", get(get_themes))
        .route("/api/themes/daily", get(get_daily_theme))
        .route("/api/community/stats", get(get_stats))
        .route("/api/community/cookies-picks", get(get_featured))
        // Password analyzer
        .route("/api/check-password", post(password::check_password))
        // Export and assistant
        .route("/api/export/chain/{chain_id}", get(export_chain))
        .route("/api/ai/continue-story", post(continue_story))
}

fn member_routes(app_state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/api/auth/me", get(get_me))
        .route("/api/rooms", post(rooms::create_room))
        .route("/api/stories", post(stories::create_story))
        .route("/api/stories/{id}/heart", post(stories::heart_story))
        .route(
            "/api/password-history",
            get(password::list_history).post(password::save_history),
        )
        .route("/api/password-history/{id}", delete(password::delete_history))
        .route_layer(from_fn_with_state(app_state.clone(), auth_middleware))
}

// Layers added later run first: authentication before the role gate.
fn moderator_routes(app_state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/api/admin/featured", post(feature_story))
        .route_layer(from_fn(require_moderator))
        .route_layer(from_fn_with_state(app_state.clone(), auth_middleware))
}

fn admin_routes(app_state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/api/admin/users", get(admin::list_users))
        .route("/api/admin/users/{id}", delete(admin::delete_user))
        .route("/api/admin/users/{id}/approve", post(admin::approve_user))
        .route("/api/admin/users/{id}/reject", post(admin::reject_user))
        .route("/api/admin/users/{id}/suspend", post(admin::suspend_user))
        .route("/api/admin/users/{id}/delete", post(admin::delete_user))
        .route("/api/admin/users/{id}/role", patch(admin::change_role))
        .route_layer(from_fn(require_admin))
        .route_layer(from_fn_with_state(app_state.clone(), auth_middleware))
}
