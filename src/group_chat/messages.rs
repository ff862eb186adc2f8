use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A message posted to the group chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub source: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(source: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            source: source.into(),
            content: content.into(),
            created_at: Utc::now(),
        }
    }
}

/// Outcome of a team run: every message, task first, and why it stopped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResult {
    pub messages: Vec<ChatMessage>,
    pub stop_reason: Option<String>,
}
