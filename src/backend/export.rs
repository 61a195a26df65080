//! Chain Export
//!
//! `GET /api/export/chain/{chain_id}?format=text|markdown|json` returns the
//! chain as a downloadable document. `pdf` and `image` are recognised but
//! answer 501 Not Implemented.

use std::fmt::Write as _;
use std::str::FromStr;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::backend::error::BackendError;
use crate::backend::stories::db::get_chain;
use crate::shared::story::StoryChain;
use crate::shared::SharedError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Text,
    Markdown,
    Json,
    Pdf,
    Image,
}

impl ExportFormat {
    fn extension(&self) -> &'static str {
        match self {
            Self::Text => "txt",
            Self::Markdown => "md",
            Self::Json => "json",
            Self::Pdf => "pdf",
            Self::Image => "png",
        }
    }

    fn content_type(&self) -> &'static str {
        match self {
            Self::Text => "text/plain; charset=utf-8",
            Self::Markdown => "text/markdown; charset=utf-8",
            Self::Json => "application/json",
            Self::Pdf => "application/pdf",
            Self::Image => "image/png",
        }
    }

    fn is_binary(&self) -> bool {
        matches!(self, Self::Pdf | Self::Image)
    }
}

impl FromStr for ExportFormat {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(Self::Text),
            "markdown" | "md" => Ok(Self::Markdown),
            "json" => Ok(Self::Json),
            "pdf" => Ok(Self::Pdf),
            "image" | "png" => Ok(Self::Image),
            other => Err(SharedError::validation("format", format!("Unknown export format '{}'", other))),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    pub format: Option<String>,
}

fn summary_line(chain: &StoryChain) -> String {
    format!(
        "{} {}, {} {}, {} {}",
        chain.stories.len(),
        if chain.stories.len() == 1 { "part" } else { "parts" },
        chain.contributor_count,
        if chain.contributor_count == 1 { "contributor" } else { "contributors" },
        chain.total_hearts,
        if chain.total_hearts == 1 { "heart" } else { "hearts" },
    )
}

pub fn render_text(chain: &StoryChain) -> String {
    let mut out = format!("Story Chain #{}\n{}\n", chain.chain_id, summary_line(chain));
    for story in &chain.stories {
        let _ = write!(out, "\n{}. {}\n   by {}\n", story.sequence, story.content, story.author_name);
    }
    out
}

pub fn render_markdown(chain: &StoryChain) -> String {
    let mut out = format!("# Story Chain #{}\n\n_{}_\n", chain.chain_id, summary_line(chain));
    for story in &chain.stories {
        let _ = write!(
            out,
            "\n**{}.** {}\n\n*by {}*\n",
            story.sequence, story.content, story.author_name
        );
    }
    out
}

/// Render `chain` in a text format; binary formats are rejected
pub fn render(chain: &StoryChain, format: ExportFormat) -> Result<String, BackendError> {
    match format {
        ExportFormat::Text => Ok(render_text(chain)),
        ExportFormat::Markdown => Ok(render_markdown(chain)),
        ExportFormat::Json => Ok(serde_json::to_string_pretty(chain)?),
        ExportFormat::Pdf | ExportFormat::Image => Err(render_unavailable(format)),
    }
}

pub async fn export_chain(
    State(pool): State<SqlitePool>,
    Path(chain_id): Path<i64>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, BackendError> {
    let format: ExportFormat = query.format.as_deref().unwrap_or("text").parse()?;
    if format.is_binary() {
        tracing::debug!("Rejected {:?} export of chain {}", format, chain_id);
        return Err(render_unavailable(format));
    }

    let chain = get_chain(&pool, chain_id)
        .await?
        .ok_or_else(|| BackendError::not_found(format!("Chain {} not found", chain_id)))?;
    let body = render(&chain, format)?;

    let disposition = format!(
        "attachment; filename=\"story-chain-{}.{}\"",
        chain_id,
        format.extension()
    );
    Ok((
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

fn render_unavailable(format: ExportFormat) -> BackendError {
    BackendError::handler(
        StatusCode::NOT_IMPLEMENTED,
        format!("{} export is not available", format.extension()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::story::Story;
    use chrono::Utc;

    fn chain() -> StoryChain {
        let stories = ["The bell rang.", "Nobody answered."]
            .iter()
            .enumerate()
            .map(|(i, content)| Story {
                id: i as i64 + 1,
                chain_id: 3,
                room_id: None,
                content: content.to_string(),
                author_id: None,
                author_name: if i == 0 { "ada" } else { "ben" }.to_string(),
                sequence: i as i64 + 1,
                hearts: 1,
                comments: 0,
                created_at: Utc::now(),
            })
            .collect();
        StoryChain::from_stories(3, stories).unwrap()
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("Markdown".parse::<ExportFormat>().unwrap(), ExportFormat::Markdown);
        assert_eq!("txt".parse::<ExportFormat>().unwrap(), ExportFormat::Text);
        assert_eq!("png".parse::<ExportFormat>().unwrap(), ExportFormat::Image);
        assert!("docx".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_render_text() {
        let text = render_text(&chain());
        assert!(text.starts_with("Story Chain #3\n2 parts, 2 contributors, 2 hearts\n"));
        assert!(text.contains("1. The bell rang.\n   by ada\n"));
        assert!(text.contains("2. Nobody answered.\n   by ben\n"));
    }

    #[test]
    fn test_render_markdown() {
        let md = render_markdown(&chain());
        assert!(md.starts_with("# Story Chain #3\n"));
        assert!(md.contains("**2.** Nobody answered.\n\n*by ben*"));
    }

    #[test]
    fn test_binary_formats_not_implemented() {
        let err = render(&chain(), ExportFormat::Pdf).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_IMPLEMENTED);
        let json = render(&chain(), ExportFormat::Json).unwrap();
        assert!(json.contains("\"chainId\": 3"));
    }
}
