/**
 * Login Handler
 *
 * `POST /api/auth/login` with `{ email, password }`.
 *
 * Unknown emails and wrong passwords get the same 401 so accounts cannot be
 * enumerated. Accounts that are pending, suspended or rejected get a 401
 * explaining why.
 */

use axum::{extract::State, response::Json};
use bcrypt::verify;

use crate::backend::auth::handlers::types::{AuthResponse, LoginRequest, UserResponse};
use crate::backend::auth::sessions::create_token;
use crate::backend::auth::users::get_user_by_email;
use crate::backend::error::BackendError;
use crate::backend::server::state::AppState;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Login handler
///
/// # Errors
///
/// * `401 Unauthorized` - bad credentials, or an account that may not sign in
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, BackendError> {
    tracing::info!("Login request for: {}", request.email);

    let user = get_user_by_email(&state.db_pool, request.email.trim())
        .await?
        .ok_or_else(|| {
            tracing::warn!("User not found: {}", request.email);
            BackendError::unauthorized(INVALID_CREDENTIALS)
        })?;

    if !verify(&request.password, &user.password_hash)? {
        tracing::warn!("Invalid password for user: {}", user.username);
        return Err(BackendError::unauthorized(INVALID_CREDENTIALS));
    }

    if let Some(reason) = user.status.login_denial() {
        tracing::warn!("Login refused for {} account {}", user.status, user.username);
        return Err(BackendError::unauthorized(reason));
    }

    let token = create_token(&user, &state.config.jwt_secret, state.config.token_ttl_days)?;

    tracing::info!("User logged in successfully: {} ({})", user.username, user.email);

    Ok(Json(AuthResponse {
        message: "Login successful".to_string(),
        token,
        user: UserResponse::from(&user),
    }))
}
