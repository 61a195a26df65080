/**
 * Bootstrap Admin Handler
 *
 * `POST /api/auth/create-admin` creates an approved admin account, but only
 * while no admin exists. After that the endpoint answers 403 and further
 * admins are made by promoting users through the admin API.
 */

use axum::{extract::State, http::StatusCode, response::Json};

use crate::backend::auth::handlers::register::register_account;
use crate::backend::auth::handlers::types::{RegisterRequest, RegisterResponse, UserResponse};
use crate::backend::auth::users::{admin_exists, UserRole, UserStatus};
use crate::backend::error::BackendError;
use crate::backend::server::state::AppState;

pub async fn create_admin(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), BackendError> {
    if admin_exists(&state.db_pool).await? {
        tracing::warn!("create-admin called but an admin already exists");
        return Err(BackendError::forbidden("An admin account already exists"));
    }

    let user = register_account(&state, &request, UserRole::Admin, UserStatus::Approved).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "Admin account created".to_string(),
            user: UserResponse::from(&user),
        }),
    ))
}
