/**
 * Registration Handler
 *
 * `POST /api/auth/register`
 *
 * # Registration Process
 *
 * 1. Validate username (3-50 chars), email shape and password length (6+)
 * 2. Reject an email or username that is already taken
 * 3. Hash the password with bcrypt
 * 4. Store the account as a `pending` community member
 *
 * No token is issued: pending accounts cannot sign in until an admin
 * approves them.
 */

use axum::{extract::State, http::StatusCode, response::Json};
use bcrypt::hash;

use crate::backend::auth::handlers::types::{RegisterRequest, RegisterResponse, UserResponse};
use crate::backend::auth::users::{
    create_user, get_user_by_email, get_user_by_username, User, UserRole, UserStatus,
};
use crate::backend::error::BackendError;
use crate::backend::server::state::AppState;

/// Validate, check uniqueness, hash and insert
///
/// Shared with the create-admin handler.
pub(crate) async fn register_account(
    state: &AppState,
    request: &RegisterRequest,
    role: UserRole,
    status: UserStatus,
) -> Result<User, BackendError> {
    let (username, email) = request.validate()?;

    if get_user_by_email(&state.db_pool, &email).await?.is_some() {
        tracing::warn!("Email already registered: {}", email);
        return Err(BackendError::conflict("An account with this email already exists"));
    }
    if get_user_by_username(&state.db_pool, &username).await?.is_some() {
        tracing::warn!("Username already taken: {}", username);
        return Err(BackendError::conflict("Username is already taken"));
    }

    let password_hash = hash(&request.password, state.config.bcrypt_cost)?;
    let user = create_user(&state.db_pool, &username, &email, &password_hash, role, status).await?;

    tracing::info!("Account created: {} ({}, {})", user.username, user.role, user.status);
    Ok(user)
}

/// Register handler
///
/// # Errors
///
/// * `400 Bad Request` - invalid username, email or password
/// * `409 Conflict` - email or username already in use
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), BackendError> {
    tracing::info!("Registration request for username: {}", request.username);

    let user = register_account(&state, &request, UserRole::Community, UserStatus::Pending).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "Registration successful. Your account is pending approval.".to_string(),
            user: UserResponse::from(&user),
        }),
    ))
}
