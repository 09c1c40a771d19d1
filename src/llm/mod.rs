//! LLM access: the chat-completion seam and its OpenRouter implementation.

mod huggingface;
mod openrouter;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use huggingface::HuggingFaceClient;
pub use openrouter::OpenRouterClient;

/// Role of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single chat message in OpenAI-compatible shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("response contained no reply text")]
    EmptyReply,
}

/// Chat-completion backend.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send `messages` to `model` and return the assistant reply text.
    async fn chat_completion(&self, model: &str, messages: &[ChatMessage])
        -> Result<String, LlmError>;
}

/// Keep upstream error bodies readable in a chat log.
pub(crate) fn truncate_body(body: &str, max_len: usize) -> String {
    if body.len() <= max_len {
        return body.to_string();
    }
    let mut end = max_len;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... [truncated]", &body[..end])
}
