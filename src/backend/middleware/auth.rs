/**
 * Authentication Middleware
 *
 * This module provides middleware for protecting routes that require
 * user authentication. It extracts and verifies JWT tokens from the
 * Authorization header, reloads the account, and attaches it to the request.
 *
 * Role checks (`require_moderator`, `require_admin`) run after
 * `auth_middleware` and read the user it attached.
 */

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::backend::auth::sessions::verify_token;
use crate::backend::auth::users::{get_user_by_id, UserRole};
use crate::backend::error::BackendError;
use crate::backend::server::state::AppState;

/// Authenticated user data attached by `auth_middleware`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub role: UserRole,
}

/// Pull the token out of an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Resolve the bearer token in `headers` to an approved account
pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<AuthenticatedUser, BackendError> {
    let token = bearer_token(headers).ok_or_else(|| {
        tracing::warn!("Missing or malformed Authorization header");
        BackendError::unauthorized("Authentication required")
    })?;

    let claims = verify_token(token, &state.config.jwt_secret).map_err(|e| {
        tracing::warn!("Invalid token: {:?}", e);
        BackendError::unauthorized("Invalid or expired token")
    })?;

    let user_id = claims
        .user_id()
        .ok_or_else(|| BackendError::unauthorized("Invalid or expired token"))?;

    // Reload so that suspensions and role changes apply immediately
    let user = get_user_by_id(&state.db_pool, user_id).await?.ok_or_else(|| {
        tracing::warn!("Token for unknown user {}", user_id);
        BackendError::unauthorized("Invalid or expired token")
    })?;

    if let Some(reason) = user.status.login_denial() {
        tracing::warn!("Rejected request from {} account {}", user.status, user.username);
        return Err(BackendError::unauthorized(reason));
    }

    Ok(AuthenticatedUser {
        user_id: user.id,
        username: user.username,
        email: user.email,
        role: user.role,
    })
}

/// Authentication middleware
///
/// Returns 401 if the token is missing, invalid or expired, or if the
/// account no longer exists or is not approved.
pub async fn auth_middleware(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, BackendError> {
    let user = authenticate(&app_state, request.headers()).await?;
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

fn require_role(request: &Request, required: UserRole) -> Result<(), BackendError> {
    let user = request
        .extensions()
        .get::<AuthenticatedUser>()
        .ok_or_else(|| BackendError::unauthorized("Authentication required"))?;

    if !user.role.satisfies(required) {
        tracing::warn!("{} ({}) lacks {} privileges", user.username, user.role, required);
        return Err(BackendError::forbidden(format!("{} access required", required)));
    }
    Ok(())
}

/// Allow moderators and admins through
pub async fn require_moderator(request: Request, next: Next) -> Result<Response, BackendError> {
    require_role(&request, UserRole::Moderator)?;
    Ok(next.run(request).await)
}

/// Allow admins through
pub async fn require_admin(request: Request, next: Next) -> Result<Response, BackendError> {
    require_role(&request, UserRole::Admin)?;
    Ok(next.run(request).await)
}

/// Axum extractor for the user attached by `auth_middleware`
#[derive(Clone, Debug)]
pub struct AuthUser(pub AuthenticatedUser);

impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = BackendError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| {
                tracing::warn!("AuthenticatedUser not found in request extensions");
                BackendError::unauthorized("Authentication required")
            })
    }
}
