//! Writing Themes
//!
//! `GET /api/themes` lists the catalogue. `GET /api/themes/daily` returns the
//! theme scheduled for today (`active_date`), or else rotates through the
//! catalogue by day so every server shows the same theme on a given date.

use axum::{extract::State, response::Json};
use chrono::{Datelike, NaiveDate, Utc};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::backend::error::BackendError;

const THEME_COLUMNS: &str = "id, title, prompt, description, active_date";

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    pub id: i64,
    pub title: String,
    pub prompt: String,
    pub description: Option<String>,
    pub active_date: Option<NaiveDate>,
}

pub async fn list_themes(pool: &SqlitePool) -> Result<Vec<Theme>, sqlx::Error> {
    sqlx::query_as::<_, Theme>(&format!("SELECT {THEME_COLUMNS} FROM themes ORDER BY id"))
        .fetch_all(pool)
        .await
}

/// Catalogue position for `date` when nothing is scheduled
pub fn rotation_index(date: NaiveDate, count: usize) -> Option<usize> {
    if count == 0 {
        return None;
    }
    let day = usize::try_from(date.num_days_from_ce()).unwrap_or_default();
    Some(day % count)
}

pub async fn theme_for_date(pool: &SqlitePool, date: NaiveDate) -> Result<Option<Theme>, sqlx::Error> {
    let scheduled = sqlx::query_as::<_, Theme>(&format!(
        "SELECT {THEME_COLUMNS} FROM themes WHERE active_date = ? ORDER BY id LIMIT 1"
    ))
    .bind(date)
    .fetch_optional(pool)
    .await?;
    if scheduled.is_some() {
        return Ok(scheduled);
    }

    let mut themes = list_themes(pool).await?;
    Ok(rotation_index(date, themes.len()).map(|i| themes.swap_remove(i)))
}

pub async fn get_themes(State(pool): State<SqlitePool>) -> Result<Json<Vec<Theme>>, BackendError> {
    Ok(Json(list_themes(&pool).await?))
}

pub async fn get_daily_theme(State(pool): State<SqlitePool>) -> Result<Json<Theme>, BackendError> {
    let today = Utc::now().date_naive();
    theme_for_date(&pool, today)
        .await?
        .map(Json)
        .ok_or_else(|| BackendError::not_found("No themes available"))
}
