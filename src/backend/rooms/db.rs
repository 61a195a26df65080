/**
 * Room Persistence
 *
 * Rooms are durable rows; who is currently *in* a room lives only in the
 * realtime registry. Each room carries a six character join code drawn from
 * `A-Z0-9`. Codes are unique; a collision on insert is retried with a fresh
 * code.
 */

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

pub const ROOM_CODE_LENGTH: usize = 6;

const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

const CODE_ATTEMPTS: usize = 5;

const ROOM_COLUMNS: &str = "id, name, prompt, code, is_private, is_themed, theme, creator_id, created_at";

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: Uuid,
    pub name: String,
    pub prompt: Option<String>,
    pub code: String,
    pub is_private: bool,
    pub is_themed: bool,
    pub theme: Option<String>,
    pub creator_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Fields of a room about to be created
#[derive(Debug, Clone, Default)]
pub struct NewRoom {
    pub name: String,
    pub prompt: Option<String>,
    pub is_private: bool,
    pub is_themed: bool,
    pub theme: Option<String>,
    pub creator_id: Option<Uuid>,
}

/// Random join code such as `K3ZQ0A`
pub fn generate_room_code() -> String {
    let mut n = Uuid::new_v4().as_u128();
    let base = CODE_ALPHABET.len() as u128;
    (0..ROOM_CODE_LENGTH)
        .map(|_| {
            let c = CODE_ALPHABET[(n % base) as usize] as char;
            n /= base;
            c
        })
        .collect()
}

/// Normalise user input to the stored code form
pub fn normalize_room_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

fn is_code_collision(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

pub async fn create_room(pool: &SqlitePool, room: &NewRoom) -> Result<Room, sqlx::Error> {
    let mut attempt = 1;
    loop {
        let result = sqlx::query_as::<_, Room>(&format!(
            r#"
            INSERT INTO rooms (id, name, prompt, code, is_private, is_themed, theme, creator_id, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {ROOM_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&room.name)
        .bind(&room.prompt)
        .bind(generate_room_code())
        .bind(room.is_private)
        .bind(room.is_themed)
        .bind(&room.theme)
        .bind(room.creator_id)
        .bind(Utc::now())
        .fetch_one(pool)
        .await;

        match result {
            Err(e) if attempt < CODE_ATTEMPTS && is_code_collision(&e) => {
                tracing::debug!("Room code collision, retrying (attempt {})", attempt);
                attempt += 1;
            }
            other => return other,
        }
    }
}

pub async fn get_room(pool: &SqlitePool, id: Uuid) -> Result<Option<Room>, sqlx::Error> {
    sqlx::query_as::<_, Room>(&format!("SELECT {ROOM_COLUMNS} FROM rooms WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Look a room up by join code, ignoring case
pub async fn get_room_by_code(pool: &SqlitePool, code: &str) -> Result<Option<Room>, sqlx::Error> {
    sqlx::query_as::<_, Room>(&format!("SELECT {ROOM_COLUMNS} FROM rooms WHERE code = ?"))
        .bind(normalize_room_code(code))
        .fetch_optional(pool)
        .await
}

/// Public rooms, newest first
pub async fn list_public_rooms(pool: &SqlitePool, limit: i64) -> Result<Vec<Room>, sqlx::Error> {
    sqlx::query_as::<_, Room>(&format!(
        "SELECT {ROOM_COLUMNS} FROM rooms WHERE is_private = 0 ORDER BY created_at DESC LIMIT ?"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await
}
