//! WebSocket event and HTTP response types.
//!
//! Every WebSocket frame is a JSON text frame shaped
//! `{"event": "<name>", "data": <payload>}`.

use serde::{Deserialize, Serialize};

/// Kind of a rendered chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Echo of what the user typed
    User,
    /// Status lines and command output
    System,
    /// Anything that went wrong
    Error,
    /// Reply relayed from the model
    Assistant,
}

/// A unit of chat exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEntry {
    pub text: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
}

/// A file announced to a session, downloadable via `/download/{filename}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub filename: String,
    /// Unix epoch seconds; display only.
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInput {
    pub text: String,
}

/// Events the client sends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    UserInput(UserInput),
}

impl ClientEvent {
    pub fn user_input(text: impl Into<String>) -> Self {
        Self::UserInput(UserInput { text: text.into() })
    }
}

/// Events the server sends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    Message(ChatEntry),
    Error(String),
    FileUpdate(FileRecord),
}

impl ServerEvent {
    pub fn message(text: impl Into<String>, kind: MessageKind) -> Self {
        Self::Message(ChatEntry {
            text: text.into(),
            kind,
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Message(_) => "message",
            Self::Error(_) => "error",
            Self::FileUpdate(_) => "file_update",
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}
