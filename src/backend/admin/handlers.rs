/**
 * Admin Moderation Handlers
 *
 * Every route here sits behind `auth_middleware` and `require_admin`.
 *
 * - `GET /api/admin/users`
 * - `POST /api/admin/users/{id}/approve`, `/reject`, `/suspend`
 * - `DELETE /api/admin/users/{id}` (also `POST /api/admin/users/{id}/delete`)
 * - `PATCH /api/admin/users/{id}/role`
 *
 * Admins cannot delete, reject, suspend or re-role their own account, so a
 * server can never lose its last working admin through this API.
 */

use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::backend::auth::handlers::UserResponse;
use crate::backend::auth::users::{self, UserRole, UserStatus};
use crate::backend::error::BackendError;
use crate::backend::middleware::{AuthUser, AuthenticatedUser};

#[derive(Debug, Clone, Deserialize)]
pub struct RoleChangeRequest {
    pub role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationResponse {
    pub message: String,
    pub user: UserResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub message: String,
}

fn reject_self_action(actor: &AuthenticatedUser, target: Uuid, action: &str) -> Result<(), BackendError> {
    if actor.user_id == target {
        tracing::warn!("{} tried to {} their own account", actor.username, action);
        return Err(BackendError::bad_request(format!("You cannot {} your own account", action)));
    }
    Ok(())
}

pub async fn list_users(State(pool): State<SqlitePool>) -> Result<Json<Vec<UserResponse>>, BackendError> {
    let all = users::list_users(&pool).await?;
    Ok(Json(all.iter().map(UserResponse::from).collect()))
}

async fn set_status(
    pool: &SqlitePool,
    actor: &AuthenticatedUser,
    target: Uuid,
    status: UserStatus,
    verb: &str,
) -> Result<Json<ModerationResponse>, BackendError> {
    if status != UserStatus::Approved {
        reject_self_action(actor, target, verb)?;
    }

    let user = users::update_user_status(pool, target, status)
        .await?
        .ok_or_else(|| BackendError::not_found("User not found"))?;
    tracing::info!("{} set {} to {}", actor.username, user.username, status);

    Ok(Json(ModerationResponse {
        message: format!("User {} is now {}", user.username, status),
        user: UserResponse::from(&user),
    }))
}

pub async fn approve_user(
    AuthUser(actor): AuthUser,
    State(pool): State<SqlitePool>,
    Path(id): Path<Uuid>,
) -> Result<Json<ModerationResponse>, BackendError> {
    set_status(&pool, &actor, id, UserStatus::Approved, "approve").await
}

pub async fn reject_user(
    AuthUser(actor): AuthUser,
    State(pool): State<SqlitePool>,
    Path(id): Path<Uuid>,
) -> Result<Json<ModerationResponse>, BackendError> {
    set_status(&pool, &actor, id, UserStatus::Rejected, "reject").await
}

pub async fn suspend_user(
    AuthUser(actor): AuthUser,
    State(pool): State<SqlitePool>,
    Path(id): Path<Uuid>,
) -> Result<Json<ModerationResponse>, BackendError> {
    set_status(&pool, &actor, id, UserStatus::Suspended, "suspend").await
}

/// Delete an account; hearts it gave are removed and story counters adjusted
pub async fn delete_user(
    AuthUser(actor): AuthUser,
    State(pool): State<SqlitePool>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteResponse>, BackendError> {
    reject_self_action(&actor, id, "delete")?;

    if !users::delete_user(&pool, id).await? {
        return Err(BackendError::not_found("User not found"));
    }
    tracing::info!("{} deleted user {}", actor.username, id);

    Ok(Json(DeleteResponse {
        message: "User deleted".to_string(),
    }))
}

pub async fn change_role(
    AuthUser(actor): AuthUser,
    State(pool): State<SqlitePool>,
    Path(id): Path<Uuid>,
    Json(request): Json<RoleChangeRequest>,
) -> Result<Json<ModerationResponse>, BackendError> {
    reject_self_action(&actor, id, "change the role of")?;
    let role: UserRole = request.role.trim().parse()?;

    let user = users::update_user_role(&pool, id, role)
        .await?
        .ok_or_else(|| BackendError::not_found("User not found"))?;
    tracing::info!("{} made {} a {}", actor.username, user.username, role);

    Ok(Json(ModerationResponse {
        message: format!("User {} is now a {}", user.username, role),
        user: UserResponse::from(&user),
    }))
}
