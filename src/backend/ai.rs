/**
 * Story Continuation
 *
 * `POST /api/ai/continue-story {context}` asks an OpenAI-compatible
 * chat-completions endpoint for the next line of a story.
 *
 * # Errors
 *
 * * `400 Bad Request` - empty context
 * * `503 Service Unavailable` - `AI_API_URL`/`AI_API_KEY` not configured
 * * `502 Bad Gateway` - the provider failed or answered without text
 */

use std::time::Duration;

use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};

use crate::backend::error::BackendError;
use crate::backend::server::state::AppState;
use crate::shared::story::MAX_STORY_LENGTH;
use crate::shared::AiConfig;

const SYSTEM_PROMPT: &str = "You help people write collaborative stories. \
Continue the story with one or two vivid sentences that fit its tone. \
Reply with the continuation only.";

/// Longest context forwarded to the provider, in characters
const MAX_CONTEXT_CHARS: usize = 4_000;
const MAX_TOKENS: u32 = 120;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Deserialize)]
pub struct ContinueRequest {
    #[serde(default)]
    pub context: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContinueResponse {
    pub continuation: String,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Keep the tail of long contexts, where the story currently is
fn trim_context(context: &str) -> &str {
    let count = context.chars().count();
    if count <= MAX_CONTEXT_CHARS {
        return context;
    }
    let skip = count - MAX_CONTEXT_CHARS;
    context
        .char_indices()
        .nth(skip)
        .map_or(context, |(i, _)| &context[i..])
}

/// Clip a continuation to what a story contribution may hold
fn clip_continuation(text: &str) -> String {
    text.trim().chars().take(MAX_STORY_LENGTH).collect()
}

pub async fn request_continuation(
    client: &reqwest::Client,
    ai: &AiConfig,
    context: &str,
) -> Result<String, BackendError> {
    let body = ChatCompletionRequest {
        model: &ai.model,
        messages: vec![
            ChatMessage { role: "system", content: SYSTEM_PROMPT },
            ChatMessage { role: "user", content: trim_context(context) },
        ],
        max_tokens: MAX_TOKENS,
        temperature: 0.8,
    };

    let response = client
        .post(&ai.api_url)
        .bearer_auth(&ai.api_key)
        .timeout(REQUEST_TIMEOUT)
        .json(&body)
        .send()
        .await
        .map_err(|e| {
            tracing::error!("Continuation request failed: {}", e);
            BackendError::upstream("Story assistant is unreachable")
        })?;

    let status = response.status();
    if !status.is_success() {
        tracing::error!("Continuation provider answered {}", status);
        return Err(BackendError::upstream(format!("Story assistant failed ({})", status.as_u16())));
    }

    let parsed: ChatCompletionResponse = response.json().await.map_err(|e| {
        tracing::error!("Unreadable continuation response: {}", e);
        BackendError::upstream("Story assistant sent an unreadable reply")
    })?;

    parsed
        .choices
        .into_iter()
        .find_map(|choice| choice.message.content)
        .map(|text| clip_continuation(&text))
        .filter(|text| !text.is_empty())
        .ok_or_else(|| BackendError::upstream("Story assistant returned no text"))
}

pub async fn continue_story(
    State(state): State<AppState>,
    Json(request): Json<ContinueRequest>,
) -> Result<Json<ContinueResponse>, BackendError> {
    let context = request.context.trim();
    if context.is_empty() {
        return Err(BackendError::bad_request("Story context is required"));
    }
    let ai = state
        .config
        .ai
        .as_ref()
        .ok_or_else(|| BackendError::state("Story assistant is not configured"))?;

    let continuation = request_continuation(&state.http_client, ai, context).await?;
    tracing::debug!("Generated a {}-character continuation", continuation.chars().count());
    Ok(Json(ContinueResponse { continuation }))
}
