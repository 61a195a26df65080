/**
 * Story Persistence
 *
 * # Sequence Assignment
 *
 * A story's position in its chain is computed inside the INSERT itself
 * (`SELECT COALESCE(MAX(sequence), 0) + 1 ... WHERE chain_id = ?`), so the
 * read and the write happen under SQLite's single write lock. The
 * `UNIQUE (chain_id, sequence)` index is the backstop: if two writers ever
 * raced to the same number, the loser gets a unique violation and
 * `create_story` retries it against the new maximum.
 *
 * Starting a new chain works the same way over `MAX(chain_id)`. A
 * client-chosen chain id must name an existing chain or be no greater than
 * the next free id, checked in the same statement, so chain ids stay dense
 * and `MAX(chain_id) + 1` cannot overflow.
 *
 * # Hearts
 *
 * `stories.hearts` is a denormalised count of `hearts` rows. Every toggle
 * changes both inside one `BEGIN IMMEDIATE` transaction, so concurrent
 * toggles queue on the busy timeout instead of failing.
 */

use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::shared::story::{assemble_chains, Story, StoryChain};

const STORY_COLUMNS: &str =
    "id, chain_id, room_id, content, author_id, author_name, sequence, hearts, comments, created_at";

/// Attempts before a contended insert gives up
const MAX_INSERT_ATTEMPTS: usize = 10;
const RETRY_BACKOFF: Duration = Duration::from_millis(5);

/// Validated input for a new story
#[derive(Debug, Clone)]
pub struct NewStory {
    /// `None` starts a new chain
    pub chain_id: Option<i64>,
    pub room_id: Option<Uuid>,
    pub content: String,
    pub author_id: Uuid,
    pub author_name: String,
}

/// Which stories a chain listing covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainScope {
    /// Every room and the global scope
    All,
    /// Only stories without a room
    Global,
    /// Only stories in one room
    Room(Uuid),
}

/// Result of toggling a heart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HeartToggle {
    /// Whether the user's heart is now present
    pub hearted: bool,
    /// The story's heart count after the toggle
    pub hearts: i64,
}

fn is_retryable(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => {
            // SQLITE_BUSY (5) and its extended codes such as BUSY_SNAPSHOT (517)
            db.is_unique_violation()
                || db
                    .code()
                    .and_then(|code| code.parse::<i32>().ok())
                    .is_some_and(|code| code & 0xff == 5)
        }
        _ => false,
    }
}

async fn insert_story_once(pool: &SqlitePool, story: &NewStory) -> Result<Option<Story>, sqlx::Error> {
    let now = Utc::now();
    match story.chain_id {
        Some(chain_id) => {
            // Later contributions inherit the room of the chain's first story.
            sqlx::query_as::<_, Story>(&format!(
                r#"
                INSERT INTO stories (chain_id, room_id, content, author_id, author_name, sequence, hearts, comments, created_at)
                SELECT * FROM (
                    SELECT ?1,
                           CASE WHEN COUNT(*) > 0
                                THEN (SELECT room_id FROM stories WHERE chain_id = ?1 ORDER BY sequence LIMIT 1)
                                ELSE ?2 END,
                           ?3, ?4, ?5, COALESCE(MAX(sequence), 0) + 1, 0, 0, ?6
                    FROM stories
                    WHERE chain_id = ?1
                )
                WHERE ?1 <= (SELECT COALESCE(MAX(chain_id), 0) + 1 FROM stories)
                RETURNING {STORY_COLUMNS}
                "#
            ))
            .bind(chain_id)
            .bind(story.room_id)
            .bind(&story.content)
            .bind(story.author_id)
            .bind(&story.author_name)
            .bind(now)
            .fetch_optional(pool)
            .await
        }
        None => {
            sqlx::query_as::<_, Story>(&format!(
                r#"
                INSERT INTO stories (chain_id, room_id, content, author_id, author_name, sequence, hearts, comments, created_at)
                SELECT COALESCE(MAX(chain_id), 0) + 1, ?1, ?2, ?3, ?4, 1, 0, 0, ?5
                FROM stories
                RETURNING {STORY_COLUMNS}
                "#
            ))
            .bind(story.room_id)
            .bind(&story.content)
            .bind(story.author_id)
            .bind(&story.author_name)
            .bind(now)
            .fetch_one(pool)
            .await
            .map(Some)
        }
    }
}

/// Insert a story, assigning its sequence (and chain id when starting a chain)
///
/// Returns `None` when `chain_id` names neither an existing chain nor the
/// next free one.
///
/// # Errors
/// Returns the last database error if the insert still conflicts after
/// several attempts.
pub async fn create_story(pool: &SqlitePool, story: &NewStory) -> Result<Option<Story>, sqlx::Error> {
    let mut attempt = 1;
    loop {
        match insert_story_once(pool, story).await {
            Ok(created) => return Ok(created),
            Err(e) if attempt < MAX_INSERT_ATTEMPTS && is_retryable(&e) => {
                tracing::debug!("Story insert contended (attempt {}): {}", attempt, e);
                tokio::time::sleep(RETRY_BACKOFF * attempt as u32).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

pub async fn get_story(pool: &SqlitePool, id: i64) -> Result<Option<Story>, sqlx::Error> {
    sqlx::query_as::<_, Story>(&format!("SELECT {STORY_COLUMNS} FROM stories WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// All stories of one chain, in sequence order
pub async fn get_chain_stories(pool: &SqlitePool, chain_id: i64) -> Result<Vec<Story>, sqlx::Error> {
    sqlx::query_as::<_, Story>(&format!(
        "SELECT {STORY_COLUMNS} FROM stories WHERE chain_id = ? ORDER BY sequence"
    ))
    .bind(chain_id)
    .fetch_all(pool)
    .await
}

/// One chain with aggregates, `None` if it has no stories
pub async fn get_chain(pool: &SqlitePool, chain_id: i64) -> Result<Option<StoryChain>, sqlx::Error> {
    let stories = get_chain_stories(pool, chain_id).await?;
    Ok(StoryChain::from_stories(chain_id, stories))
}

/// The `limit` most recently active chains in `scope`
pub async fn list_recent_chains(
    pool: &SqlitePool,
    scope: ChainScope,
    limit: i64,
) -> Result<Vec<StoryChain>, sqlx::Error> {
    let filter = match scope {
        ChainScope::All => "",
        ChainScope::Global => "WHERE room_id IS NULL",
        ChainScope::Room(_) => "WHERE room_id = ?1",
    };
    let sql = format!(
        r#"
        SELECT {STORY_COLUMNS}
        FROM stories
        WHERE chain_id IN (
            SELECT chain_id FROM stories {filter}
            GROUP BY chain_id
            ORDER BY MAX(created_at) DESC, chain_id DESC
            LIMIT ?2
        )
        ORDER BY chain_id, sequence
        "#
    );

    let room = match scope {
        ChainScope::Room(id) => Some(id),
        _ => None,
    };
    let stories = sqlx::query_as::<_, Story>(&sql)
        .bind(room)
        .bind(limit)
        .fetch_all(pool)
        .await?;

    Ok(assemble_chains(stories))
}

/// Stories written by one user, newest first
pub async fn stories_by_author(
    pool: &SqlitePool,
    author_id: Uuid,
    limit: i64,
) -> Result<Vec<Story>, sqlx::Error> {
    sqlx::query_as::<_, Story>(&format!(
        "SELECT {STORY_COLUMNS} FROM stories WHERE author_id = ? ORDER BY created_at DESC, id DESC LIMIT ?"
    ))
    .bind(author_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Id a client can use to start a new chain
///
/// Advisory only: two clients may be handed the same id. Posting a story
/// without a chain id is the race-free way to start a chain.
pub async fn next_chain_id(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COALESCE(MAX(chain_id), 0) + 1 FROM stories")
        .fetch_one(pool)
        .await
}

async fn adjust_hearts(conn: &mut SqliteConnection, story_id: i64, delta: i64) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("UPDATE stories SET hearts = hearts + ? WHERE id = ? RETURNING hearts")
        .bind(delta)
        .bind(story_id)
        .fetch_one(conn)
        .await
}

/// Add the user's heart if absent, remove it if present
///
/// Returns `None` when the story does not exist.
pub async fn toggle_heart(
    pool: &SqlitePool,
    story_id: i64,
    user_id: Uuid,
) -> Result<Option<HeartToggle>, sqlx::Error> {
    // Take the write lock up front; a deferred transaction that reads first
    // cannot upgrade while another toggle holds it.
    let mut tx = pool.begin_with("BEGIN IMMEDIATE").await?;

    let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM stories WHERE id = ?")
        .bind(story_id)
        .fetch_optional(&mut *tx)
        .await?;
    if exists.is_none() {
        return Ok(None);
    }

    let removed = sqlx::query("DELETE FROM hearts WHERE story_id = ? AND user_id = ?")
        .bind(story_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    let toggle = if removed > 0 {
        HeartToggle {
            hearted: false,
            hearts: adjust_hearts(&mut tx, story_id, -1).await?,
        }
    } else {
        sqlx::query("INSERT INTO hearts (story_id, user_id, created_at) VALUES (?, ?, ?)")
            .bind(story_id)
            .bind(user_id)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;
        HeartToggle {
            hearted: true,
            hearts: adjust_hearts(&mut tx, story_id, 1).await?,
        }
    };

    tx.commit().await?;
    Ok(Some(toggle))
}
