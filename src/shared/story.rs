/**
 * Story and Story Chain Types
 *
 * A story is one contribution to a chain. Chains are not stored as rows;
 * they are derived on read by grouping stories that share a `chain_id`.
 */
use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::SharedError;

/// Longest contribution accepted, in characters
pub const MAX_STORY_LENGTH: usize = 500;

/// A single contribution to a chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ssr", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Story {
    pub id: i64,
    pub chain_id: i64,
    /// `None` means the story belongs to the global scope
    pub room_id: Option<Uuid>,
    pub content: String,
    pub author_id: Option<Uuid>,
    pub author_name: String,
    /// Position within the chain, assigned by the database
    pub sequence: i64,
    pub hearts: i64,
    pub comments: i64,
    pub created_at: DateTime<Utc>,
}

impl Story {
    /// Room key this story's notifications go to
    pub fn room_key(&self) -> String {
        match self.room_id {
            Some(id) => id.to_string(),
            None => crate::shared::event::GLOBAL_ROOM.to_string(),
        }
    }
}

/// Body of `POST /api/stories`
///
/// The author and the sequence number come from the server, never from the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStoryRequest {
    /// Existing chain to extend; `None` starts a new chain
    #[serde(default)]
    pub chain_id: Option<i64>,
    #[serde(default)]
    pub room_id: Option<Uuid>,
    pub content: String,
}

impl NewStoryRequest {
    /// Trim the content and check its length
    pub fn validated_content(&self) -> Result<String, SharedError> {
        let content = self.content.trim();
        if content.is_empty() {
            return Err(SharedError::validation("content", "Story content cannot be empty"));
        }
        if content.chars().count() > MAX_STORY_LENGTH {
            return Err(SharedError::validation(
                "content",
                format!("Story content must be at most {} characters", MAX_STORY_LENGTH),
            ));
        }
        if let Some(chain_id) = self.chain_id {
            if chain_id < 1 {
                return Err(SharedError::validation("chainId", "Chain id must be positive"));
            }
        }
        Ok(content.to_string())
    }
}

/// Stories sharing a chain id, ordered by sequence, with aggregates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryChain {
    pub chain_id: i64,
    pub stories: Vec<Story>,
    pub total_hearts: i64,
    pub total_comments: i64,
    pub contributor_count: usize,
    pub last_activity: DateTime<Utc>,
}

impl StoryChain {
    /// Build a chain from its stories
    ///
    /// Returns `None` for an empty list. Stories are sorted by sequence.
    pub fn from_stories(chain_id: i64, mut stories: Vec<Story>) -> Option<Self> {
        stories.sort_by_key(|s| s.sequence);
        let last_activity = stories.iter().map(|s| s.created_at).max()?;

        // Authors are told apart by id; deleted accounts fall back to their display name.
        let contributors: HashSet<String> = stories
            .iter()
            .map(|s| match s.author_id {
                Some(id) => id.to_string(),
                None => s.author_name.clone(),
            })
            .collect();
        let contributor_count = contributors.len();

        Some(Self {
            chain_id,
            total_hearts: stories.iter().map(|s| s.hearts).sum(),
            total_comments: stories.iter().map(|s| s.comments).sum(),
            contributor_count,
            last_activity,
            stories,
        })
    }
}

/// Group a flat list of stories into chains
///
/// Chains come back most recently active first; ties break on the higher chain id.
pub fn assemble_chains(stories: Vec<Story>) -> Vec<StoryChain> {
    let mut grouped: BTreeMap<i64, Vec<Story>> = BTreeMap::new();
    for story in stories {
        grouped.entry(story.chain_id).or_default().push(story);
    }

    let mut chains: Vec<StoryChain> = grouped
        .into_iter()
        .filter_map(|(chain_id, stories)| StoryChain::from_stories(chain_id, stories))
        .collect();
    chains.sort_by(|a, b| {
        b.last_activity
            .cmp(&a.last_activity)
            .then(b.chain_id.cmp(&a.chain_id))
    });
    chains
}
