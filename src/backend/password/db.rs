/**
 * Password Analysis History
 *
 * Saved analyses keep the score, feedback and character-class details.
 * The password itself is only ever stored as a bcrypt hash. The table is
 * capped at `MAX_HISTORY` rows; older rows are pruned on insert.
 */

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};
use uuid::Uuid;

use crate::shared::password::{PasswordAnalysis, PasswordDetails, Strength};

pub const MAX_HISTORY: i64 = 50;

const HISTORY_COLUMNS: &str = "id, score, strength, feedback, details, created_at";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: Uuid,
    pub score: u32,
    pub strength: Strength,
    pub feedback: Vec<String>,
    pub details: PasswordDetails,
    pub created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, SqliteRow> for HistoryEntry {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let score: i64 = row.try_get("score")?;
        let score = u32::try_from(score).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        let feedback: String = row.try_get("feedback")?;
        let details: String = row.try_get("details")?;

        Ok(Self {
            id: row.try_get("id")?,
            score,
            // Bands are a function of the score, so the stored label is informational
            strength: Strength::from_score(score),
            feedback: serde_json::from_str(&feedback).map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
            details: serde_json::from_str(&details).map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// Store an analysis and prune the oldest rows beyond `MAX_HISTORY`
pub async fn save_analysis(
    pool: &SqlitePool,
    password_hash: &str,
    analysis: &PasswordAnalysis,
) -> Result<HistoryEntry, sqlx::Error> {
    let feedback = serde_json::to_string(&analysis.feedback).map_err(|e| sqlx::Error::Encode(Box::new(e)))?;
    let details = serde_json::to_string(&analysis.details).map_err(|e| sqlx::Error::Encode(Box::new(e)))?;

    let mut tx = pool.begin().await?;

    let entry = sqlx::query_as::<_, HistoryEntry>(&format!(
        r#"
        INSERT INTO password_analyses (id, password_hash, score, strength, feedback, details, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        RETURNING {HISTORY_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(password_hash)
    .bind(i64::from(analysis.score))
    .bind(analysis.strength.as_str())
    .bind(feedback)
    .bind(details)
    .bind(Utc::now())
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        DELETE FROM password_analyses
        WHERE id NOT IN (
            SELECT id FROM password_analyses ORDER BY created_at DESC LIMIT ?
        )
        "#,
    )
    .bind(MAX_HISTORY)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(entry)
}

/// Newest analyses first
pub async fn list_history(pool: &SqlitePool, limit: i64) -> Result<Vec<HistoryEntry>, sqlx::Error> {
    sqlx::query_as::<_, HistoryEntry>(&format!(
        "SELECT {HISTORY_COLUMNS} FROM password_analyses ORDER BY created_at DESC LIMIT ?"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Returns false if no such entry existed
pub async fn delete_entry(pool: &SqlitePool, id: Uuid) -> Result<bool, sqlx::Error> {
    let deleted = sqlx::query("DELETE FROM password_analyses WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?
        .rows_affected();
    Ok(deleted > 0)
}
