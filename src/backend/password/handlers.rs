//! Password Analyzer HTTP Handlers
//!
//! - `POST /api/check-password` - analyse without storing anything
//! - `POST /api/password-history` - analyse and save (bcrypt hash only)
//! - `GET /api/password-history?limit=` - newest first
//! - `DELETE /api/password-history/{id}`
//!
//! The history routes sit behind the member auth layer.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use bcrypt::hash;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::backend::error::BackendError;
use crate::backend::password::db::{self, HistoryEntry, MAX_HISTORY};
use crate::backend::server::state::AppState;
use crate::shared::password::{analyze_password, PasswordAnalysis};

const DEFAULT_HISTORY_LIMIT: i64 = 10;

#[derive(Debug, Clone, Deserialize)]
pub struct PasswordRequest {
    #[serde(default)]
    pub password: String,
}

/// `{"empty": true}` for an empty password, otherwise the analysis
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum CheckPasswordResponse {
    Empty { empty: bool },
    Analysis(PasswordAnalysis),
}

impl From<Option<PasswordAnalysis>> for CheckPasswordResponse {
    fn from(analysis: Option<PasswordAnalysis>) -> Self {
        match analysis {
            Some(analysis) => Self::Analysis(analysis),
            None => Self::Empty { empty: true },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub deleted: bool,
}

pub async fn check_password(Json(request): Json<PasswordRequest>) -> Json<CheckPasswordResponse> {
    Json(analyze_password(&request.password).into())
}

pub async fn save_history(
    State(state): State<AppState>,
    Json(request): Json<PasswordRequest>,
) -> Result<(StatusCode, Json<HistoryEntry>), BackendError> {
    let analysis = analyze_password(&request.password)
        .ok_or_else(|| BackendError::bad_request("Password is required"))?;

    let password_hash = hash(&request.password, state.config.bcrypt_cost)?;
    let entry = db::save_analysis(&state.db_pool, &password_hash, &analysis).await?;
    tracing::debug!("Saved password analysis {} ({})", entry.id, entry.strength);

    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn list_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<HistoryEntry>>, BackendError> {
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT).clamp(1, MAX_HISTORY);
    Ok(Json(db::list_history(&state.db_pool, limit).await?))
}

pub async fn delete_history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeletedResponse>, BackendError> {
    if !db::delete_entry(&state.db_pool, id).await? {
        return Err(BackendError::not_found("History entry not found"));
    }
    Ok(Json(DeletedResponse { deleted: true }))
}
