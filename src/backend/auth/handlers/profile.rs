/**
 * Public Profile Handlers
 *
 * `GET /api/users/{id}` and `GET /api/users/{id}/stories`. Profiles omit the
 * email address and only approved accounts are visible.
 */

use axum::{
    extract::{Path, State},
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::backend::auth::users::{get_user_by_id, User, UserRole, UserStatus};
use crate::backend::error::BackendError;
use crate::backend::stories::db::stories_by_author;
use crate::shared::story::Story;

const PROFILE_STORY_LIMIT: i64 = 50;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfile {
    pub id: Uuid,
    pub username: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub story_count: i64,
    pub hearts_received: i64,
}

async fn visible_user(pool: &SqlitePool, id: Uuid) -> Result<User, BackendError> {
    get_user_by_id(pool, id)
        .await?
        .filter(|u| u.status == UserStatus::Approved)
        .ok_or_else(|| BackendError::not_found("User not found"))
}

pub async fn get_profile(
    State(pool): State<SqlitePool>,
    Path(id): Path<Uuid>,
) -> Result<Json<PublicProfile>, BackendError> {
    let user = visible_user(&pool, id).await?;

    let (story_count, hearts_received): (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), COALESCE(SUM(hearts), 0) FROM stories WHERE author_id = ?",
    )
    .bind(user.id)
    .fetch_one(&pool)
    .await?;

    Ok(Json(PublicProfile {
        id: user.id,
        username: user.username,
        role: user.role,
        created_at: user.created_at,
        story_count,
        hearts_received,
    }))
}

pub async fn get_user_stories(
    State(pool): State<SqlitePool>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Story>>, BackendError> {
    let user = visible_user(&pool, id).await?;
    Ok(Json(stories_by_author(&pool, user.id, PROFILE_STORY_LIMIT).await?))
}
