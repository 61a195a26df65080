//! Community Pages
//!
//! - `GET /api/community/stats` - headline numbers for the landing page
//! - `GET /api/community/cookies-picks` - stories featured by moderators
//! - `POST /api/admin/featured` - feature a story (moderator or admin)

use axum::{extract::State, http::StatusCode, response::Json};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, FromRow, Row, SqlitePool};
use uuid::Uuid;

use crate::backend::error::BackendError;
use crate::backend::middleware::AuthUser;
use crate::backend::stories::db::get_story;
use crate::shared::story::Story;

/// Window for "active" users and recent hearts
const ACTIVITY_WINDOW_DAYS: i64 = 7;
const FEATURED_LIMIT: i64 = 20;
const MAX_NOTE_LENGTH: usize = 280;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityStats {
    pub total_stories: i64,
    /// Distinct authors in the last seven days
    pub active_users: i64,
    /// Hearts given in the last seven days
    pub total_hearts: i64,
    /// Stories written since midnight UTC
    pub daily_contributions: i64,
}

pub async fn community_stats(pool: &SqlitePool, now: DateTime<Utc>) -> Result<CommunityStats, sqlx::Error> {
    let week_ago = now - Duration::days(ACTIVITY_WINDOW_DAYS);
    let midnight = now
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|t| t.and_utc())
        .unwrap_or(now);

    let total_stories: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stories")
        .fetch_one(pool)
        .await?;
    let active_users: i64 = sqlx::query_scalar(
        "SELECT COUNT(DISTINCT author_id) FROM stories WHERE author_id IS NOT NULL AND created_at >= ?",
    )
    .bind(week_ago)
    .fetch_one(pool)
    .await?;
    let total_hearts: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM hearts WHERE created_at >= ?")
        .bind(week_ago)
        .fetch_one(pool)
        .await?;
    let daily_contributions: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stories WHERE created_at >= ?")
        .bind(midnight)
        .fetch_one(pool)
        .await?;

    Ok(CommunityStats {
        total_stories,
        active_users,
        total_hearts,
        daily_contributions,
    })
}

/// A featured story with the moderator's note
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeaturedPick {
    pub id: i64,
    pub note: Option<String>,
    pub picked_at: DateTime<Utc>,
    pub story: Story,
}

impl<'r> FromRow<'r, SqliteRow> for FeaturedPick {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("pick_id")?,
            note: row.try_get("note")?,
            picked_at: row.try_get("picked_at")?,
            story: Story::from_row(row)?,
        })
    }
}

const FEATURED_SELECT: &str = r#"
    SELECT f.id AS pick_id, f.note, f.created_at AS picked_at,
           s.id, s.chain_id, s.room_id, s.content, s.author_id, s.author_name,
           s.sequence, s.hearts, s.comments, s.created_at
    FROM featured_picks f
    JOIN stories s ON s.id = f.story_id
"#;

pub async fn list_featured(pool: &SqlitePool, limit: i64) -> Result<Vec<FeaturedPick>, sqlx::Error> {
    sqlx::query_as::<_, FeaturedPick>(&format!(
        "{FEATURED_SELECT} ORDER BY f.created_at DESC, f.id DESC LIMIT ?"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub async fn add_featured(
    pool: &SqlitePool,
    story_id: i64,
    note: Option<&str>,
    picked_by: Uuid,
) -> Result<FeaturedPick, sqlx::Error> {
    let pick_id: i64 = sqlx::query_scalar(
        "INSERT INTO featured_picks (story_id, note, picked_by, created_at) VALUES (?, ?, ?, ?) RETURNING id",
    )
    .bind(story_id)
    .bind(note)
    .bind(picked_by)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    sqlx::query_as::<_, FeaturedPick>(&format!("{FEATURED_SELECT} WHERE f.id = ?"))
        .bind(pick_id)
        .fetch_one(pool)
        .await
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureRequest {
    pub story_id: i64,
    #[serde(default)]
    pub note: Option<String>,
}

pub async fn get_stats(State(pool): State<SqlitePool>) -> Result<Json<CommunityStats>, BackendError> {
    Ok(Json(community_stats(&pool, Utc::now()).await?))
}

pub async fn get_featured(State(pool): State<SqlitePool>) -> Result<Json<Vec<FeaturedPick>>, BackendError> {
    Ok(Json(list_featured(&pool, FEATURED_LIMIT).await?))
}

pub async fn feature_story(
    AuthUser(auth): AuthUser,
    State(pool): State<SqlitePool>,
    Json(request): Json<FeatureRequest>,
) -> Result<(StatusCode, Json<FeaturedPick>), BackendError> {
    let note = request
        .note
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty());
    if note.is_some_and(|n| n.chars().count() > MAX_NOTE_LENGTH) {
        return Err(BackendError::bad_request(format!(
            "Note must be at most {} characters",
            MAX_NOTE_LENGTH
        )));
    }
    if get_story(&pool, request.story_id).await?.is_none() {
        return Err(BackendError::not_found("Story not found"));
    }

    let pick = add_featured(&pool, request.story_id, note, auth.user_id).await?;
    tracing::info!("{} featured story {}", auth.username, request.story_id);
    Ok((StatusCode::CREATED, Json(pick)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::auth::users::{create_user, UserRole, UserStatus};
    use crate::backend::server::config::in_memory_database;
    use crate::backend::stories::db::{create_story, toggle_heart, NewStory};

    async fn seed(pool: &SqlitePool) -> (Uuid, Story) {
        let user = create_user(pool, "wren", "wren@example.com", "h", UserRole::Moderator, UserStatus::Approved)
            .await
            .unwrap();
        let story = create_story(
            pool,
            &NewStory {
                chain_id: None,
                room_id: None,
                content: "The lighthouse blinked twice.".to_string(),
                author_id: user.id,
                author_name: user.username.clone(),
            },
        )
        .await
        .unwrap()
        .unwrap();
        (user.id, story)
    }

    #[tokio::test]
    async fn test_stats_count_recent_activity() {
        let pool = in_memory_database().await.unwrap();
        let (user_id, story) = seed(&pool).await;
        toggle_heart(&pool, story.id, user_id).await.unwrap();

        let stats = community_stats(&pool, Utc::now()).await.unwrap();
        assert_eq!(
            stats,
            CommunityStats {
                total_stories: 1,
                active_users: 1,
                total_hearts: 1,
                daily_contributions: 1,
            }
        );

        let later = community_stats(&pool, Utc::now() + Duration::days(30)).await.unwrap();
        assert_eq!(later.total_stories, 1);
        assert_eq!(later.active_users, 0);
        assert_eq!(later.total_hearts, 0);
        assert_eq!(later.daily_contributions, 0);
    }

    #[tokio::test]
    async fn test_featured_picks_newest_first() {
        let pool = in_memory_database().await.unwrap();
        let (user_id, story) = seed(&pool).await;

        let first = add_featured(&pool, story.id, Some("Lovely"), user_id).await.unwrap();
        let second = add_featured(&pool, story.id, None, user_id).await.unwrap();
        assert_eq!(first.story, story);

        let picks = list_featured(&pool, 10).await.unwrap();
        let ids: Vec<i64> = picks.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
        assert_eq!(picks[1].note.as_deref(), Some("Lovely"));
    }
}
