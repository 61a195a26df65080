/**
 * Get Current User Handler
 *
 * `GET /api/auth/me`, behind `auth_middleware`. Returns the signed-in
 * account without sensitive fields.
 */

use axum::{extract::State, response::Json};
use sqlx::SqlitePool;

use crate::backend::auth::handlers::types::UserResponse;
use crate::backend::auth::users::get_user_by_id;
use crate::backend::error::BackendError;
use crate::backend::middleware::AuthUser;

/// Get current user handler
///
/// # Errors
///
/// * `401 Unauthorized` - no valid token (rejected by the middleware)
/// * `404 Not Found` - the account was deleted after the token was checked
pub async fn get_me(
    AuthUser(auth): AuthUser,
    State(pool): State<SqlitePool>,
) -> Result<Json<UserResponse>, BackendError> {
    let user = get_user_by_id(&pool, auth.user_id)
        .await?
        .ok_or_else(|| BackendError::not_found("User not found"))?;

    Ok(Json(UserResponse::from(&user)))
}
