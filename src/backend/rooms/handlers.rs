//! Room HTTP Handlers
//!
//! Every room in a response carries `memberCount`, the number of realtime
//! connections currently joined to it.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::backend::error::BackendError;
use crate::backend::middleware::AuthUser;
use crate::backend::realtime::RoomRegistry;
use crate::backend::rooms::db::{self, NewRoom, Room};
use crate::backend::server::state::AppState;
use crate::shared::error::SharedError;

const MAX_ROOM_NAME_LENGTH: usize = 60;
const MAX_PROMPT_LENGTH: usize = 500;
const PUBLIC_ROOM_LIMIT: i64 = 50;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomRequest {
    pub name: String,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub is_themed: bool,
    #[serde(default)]
    pub theme: Option<String>,
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl CreateRoomRequest {
    pub fn into_new_room(self, creator_id: Uuid) -> Result<NewRoom, SharedError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(SharedError::validation("name", "Room name is required"));
        }
        if name.chars().count() > MAX_ROOM_NAME_LENGTH {
            return Err(SharedError::validation(
                "name",
                format!("Room name must be at most {} characters", MAX_ROOM_NAME_LENGTH),
            ));
        }
        let prompt = non_blank(&self.prompt);
        if prompt.as_ref().is_some_and(|p| p.chars().count() > MAX_PROMPT_LENGTH) {
            return Err(SharedError::validation(
                "prompt",
                format!("Prompt must be at most {} characters", MAX_PROMPT_LENGTH),
            ));
        }
        let theme = non_blank(&self.theme);
        if self.is_themed && theme.is_none() {
            return Err(SharedError::validation("theme", "Themed rooms need a theme"));
        }

        Ok(NewRoom {
            name,
            prompt,
            is_private: self.is_private,
            is_themed: self.is_themed,
            theme,
            creator_id: Some(creator_id),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomResponse {
    #[serde(flatten)]
    pub room: Room,
    pub member_count: usize,
}

impl RoomResponse {
    fn with_presence(room: Room, registry: &RoomRegistry) -> Self {
        let member_count = registry.member_count(&room.id.to_string());
        Self { room, member_count }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceResponse {
    pub room_id: String,
    pub member_count: usize,
}

pub async fn create_room(
    AuthUser(auth): AuthUser,
    State(state): State<AppState>,
    Json(request): Json<CreateRoomRequest>,
) -> Result<(StatusCode, Json<RoomResponse>), BackendError> {
    let new_room = request.into_new_room(auth.user_id)?;
    let room = db::create_room(&state.db_pool, &new_room).await?;
    tracing::info!("{} created room {} ({})", auth.username, room.name, room.code);

    Ok((
        StatusCode::CREATED,
        Json(RoomResponse::with_presence(room, state.registry())),
    ))
}

pub async fn list_public_rooms(State(state): State<AppState>) -> Result<Json<Vec<RoomResponse>>, BackendError> {
    let rooms = db::list_public_rooms(&state.db_pool, PUBLIC_ROOM_LIMIT).await?;
    Ok(Json(
        rooms
            .into_iter()
            .map(|room| RoomResponse::with_presence(room, state.registry()))
            .collect(),
    ))
}

pub async fn get_room(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RoomResponse>, BackendError> {
    let room = db::get_room(&state.db_pool, id)
        .await?
        .ok_or_else(|| BackendError::not_found("Room not found"))?;
    Ok(Json(RoomResponse::with_presence(room, state.registry())))
}

/// Join codes are matched case-insensitively; private rooms are reachable this way
pub async fn get_room_by_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<RoomResponse>, BackendError> {
    let room = db::get_room_by_code(&state.db_pool, &code)
        .await?
        .ok_or_else(|| BackendError::not_found("No room with that code"))?;
    Ok(Json(RoomResponse::with_presence(room, state.registry())))
}

/// Live member count for any room key, including `global`
pub async fn room_presence(
    State(registry): State<RoomRegistry>,
    Path(room_id): Path<String>,
) -> Json<PresenceResponse> {
    let member_count = registry.member_count(&room_id);
    Json(PresenceResponse { room_id, member_count })
}
