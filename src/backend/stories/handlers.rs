//! Story HTTP Handlers
//!
//! - `POST /api/stories` - add a story (authenticated), then notify the room
//! - `GET /api/stories/chains` - recent chains, optionally scoped to a room
//! - `GET /api/stories/chain/{chain_id}` - one chain
//! - `POST /api/stories/{id}/heart` - toggle the caller's heart (authenticated)
//! - `GET /api/stories/next-chain-id` - advisory id for a new chain

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::backend::error::BackendError;
use crate::backend::middleware::AuthUser;
use crate::backend::rooms::db::get_room;
use crate::backend::server::state::AppState;
use crate::backend::stories::db::{self, ChainScope, HeartToggle, NewStory};
use crate::shared::event::{ServerMessage, GLOBAL_ROOM};
use crate::shared::story::{NewStoryRequest, Story, StoryChain};

const DEFAULT_CHAIN_LIMIT: i64 = 10;
const MAX_CHAIN_LIMIT: i64 = 50;

/// Query string of `GET /api/stories/chains`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainsQuery {
    pub limit: Option<i64>,
    /// A room id, or `global` for stories outside any room
    pub room_id: Option<String>,
}

impl ChainsQuery {
    fn scope(&self) -> Result<ChainScope, BackendError> {
        match self.room_id.as_deref() {
            None | Some("") => Ok(ChainScope::All),
            Some(GLOBAL_ROOM) => Ok(ChainScope::Global),
            Some(raw) => Uuid::parse_str(raw)
                .map(ChainScope::Room)
                .map_err(|_| BackendError::bad_request("roomId must be a room id or \"global\"")),
        }
    }

    fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_CHAIN_LIMIT)
            .clamp(1, MAX_CHAIN_LIMIT)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NextChainIdResponse {
    pub chain_id: i64,
}

/// Add a story to a chain
///
/// The sequence number is assigned by the database. Once the row is committed
/// every connection joined to the story's room receives a `new-story` frame.
///
/// # Errors
///
/// * `400 Bad Request` - empty or oversized content, or a `chainId` that is
///   neither an existing chain nor the next free id
/// * `401 Unauthorized` - not signed in
/// * `404 Not Found` - `roomId` names no room
pub async fn create_story(
    AuthUser(auth): AuthUser,
    State(state): State<AppState>,
    Json(request): Json<NewStoryRequest>,
) -> Result<(StatusCode, Json<Story>), BackendError> {
    let content = request.validated_content()?;

    if let Some(room_id) = request.room_id {
        if get_room(&state.db_pool, room_id).await?.is_none() {
            return Err(BackendError::not_found("Room not found"));
        }
    }

    let story = db::create_story(
        &state.db_pool,
        &NewStory {
            chain_id: request.chain_id,
            room_id: request.room_id,
            content,
            author_id: auth.user_id,
            author_name: auth.username.clone(),
        },
    )
    .await?
    .ok_or_else(|| BackendError::bad_request("Unknown chain; start a new chain or use the next chain id"))?;

    tracing::info!(
        "{} added story {} to chain {} at position {}",
        auth.username,
        story.id,
        story.chain_id,
        story.sequence
    );

    let message = ServerMessage::NewStory {
        story: serde_json::to_value(&story)?,
        chain_id: story.chain_id,
    };
    let report = state.dispatcher.broadcast(&story.room_key(), &message);
    tracing::debug!(
        "new-story for chain {} delivered to {} connections",
        story.chain_id,
        report.delivered
    );

    Ok((StatusCode::CREATED, Json(story)))
}

/// Recent chains, most recently active first
pub async fn list_chains(
    State(pool): State<SqlitePool>,
    Query(query): Query<ChainsQuery>,
) -> Result<Json<Vec<StoryChain>>, BackendError> {
    let chains = db::list_recent_chains(&pool, query.scope()?, query.limit()).await?;
    Ok(Json(chains))
}

pub async fn get_chain(
    State(pool): State<SqlitePool>,
    Path(chain_id): Path<i64>,
) -> Result<Json<StoryChain>, BackendError> {
    db::get_chain(&pool, chain_id)
        .await?
        .map(Json)
        .ok_or_else(|| BackendError::not_found(format!("Chain {} not found", chain_id)))
}

/// Toggle the caller's heart on a story
pub async fn heart_story(
    AuthUser(auth): AuthUser,
    State(pool): State<SqlitePool>,
    Path(story_id): Path<i64>,
) -> Result<Json<HeartToggle>, BackendError> {
    let toggle = db::toggle_heart(&pool, story_id, auth.user_id)
        .await?
        .ok_or_else(|| BackendError::not_found("Story not found"))?;

    tracing::debug!(
        "{} {} story {} ({} hearts)",
        auth.username,
        if toggle.hearted { "hearted" } else { "unhearted" },
        story_id,
        toggle.hearts
    );
    Ok(Json(toggle))
}

pub async fn next_chain_id(State(pool): State<SqlitePool>) -> Result<Json<NextChainIdResponse>, BackendError> {
    let chain_id = db::next_chain_id(&pool).await?;
    Ok(Json(NextChainIdResponse { chain_id }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chains_query_scope() {
        let all = ChainsQuery::default();
        assert_eq!(all.scope().unwrap(), ChainScope::All);
        assert_eq!(all.limit(), DEFAULT_CHAIN_LIMIT);

        let global = ChainsQuery { limit: Some(500), room_id: Some("global".to_string()) };
        assert_eq!(global.scope().unwrap(), ChainScope::Global);
        assert_eq!(global.limit(), MAX_CHAIN_LIMIT);

        let room = Uuid::new_v4();
        let scoped = ChainsQuery { limit: Some(0), room_id: Some(room.to_string()) };
        assert_eq!(scoped.scope().unwrap(), ChainScope::Room(room));
        assert_eq!(scoped.limit(), 1);

        let bad = ChainsQuery { limit: None, room_id: Some("lobby".to_string()) };
        assert_eq!(bad.scope().unwrap_err().status_code(), StatusCode::BAD_REQUEST);
    }
}
