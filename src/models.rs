use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::artifact::Artifact;

/// Identity asserted by the upstream auth proxy for the current request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Chat {
    pub id: i64,
    pub public_id: Uuid,
    pub owned_by: Uuid,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Chat {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted row of the `messages` table.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Message {
    pub id: i64,
    pub public_id: Uuid,
    pub chat_id: i64,
    pub sent_by: Uuid,
    pub parent_message_id: Option<i64>,
    pub content: String,
    pub is_user_message: bool,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub branch_number: i32,
}

impl Message {
    pub fn role(&self) -> MessageRole {
        if self.is_user_message {
            MessageRole::User
        } else {
            MessageRole::Assistant
        }
    }
}

/// Insert payload for a message; ids and timestamps are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub public_id: Uuid,
    pub chat_id: i64,
    pub sent_by: Uuid,
    pub content: String,
    pub is_user_message: bool,
}

impl NewMessage {
    pub fn user(chat_id: i64, sent_by: Uuid, content: impl Into<String>) -> Self {
        Self {
            public_id: Uuid::new_v4(),
            chat_id,
            sent_by,
            content: content.into(),
            is_user_message: true,
        }
    }

    pub fn assistant(chat_id: i64, sent_by: Uuid, content: impl Into<String>) -> Self {
        Self {
            public_id: Uuid::new_v4(),
            chat_id,
            sent_by,
            content: content.into(),
            is_user_message: false,
        }
    }
}

/// One element of the conversation history exchanged with the browser and the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: MessageRole::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: MessageRole::Assistant, content: content.into() }
    }
}

impl From<&Message> for ChatMessage {
    fn from(m: &Message) -> Self {
        Self { role: m.role(), content: m.content.clone() }
    }
}

// ── REST payloads ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateChatRequest {
    pub prompt: String,
}

#[derive(Debug, Serialize)]
pub struct CreateChatResponse {
    pub chat_id: i64,
    pub public_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct MessageView {
    pub role: MessageRole,
    pub content: String,
    pub artifacts: Vec<Artifact>,
}

#[derive(Debug, Serialize)]
pub struct ChatView {
    pub chat_id: i64,
    pub public_id: Uuid,
    pub messages: Vec<MessageView>,
}

// ── WebSocket protocol ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct WsChatRequest {
    pub chat_id: i64,
    pub history: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsEvent {
    StreamStart { chat_id: i64 },
    StreamChunk { content: String },
    Artifact { index: usize, artifact: Artifact },
    StreamEnd { message_id: Option<Uuid>, full_content: String },
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_uses_lowercase_roles() {
        let json = serde_json::to_string(&ChatMessage::user("hi")).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"hi"}"#);
        let parsed: ChatMessage =
            serde_json::from_str(r#"{"role":"assistant","content":"ok"}"#).unwrap();
        assert_eq!(parsed, ChatMessage::assistant("ok"));
    }

    #[test]
    fn ws_events_are_internally_tagged() {
        let json = serde_json::to_value(WsEvent::StreamChunk { content: "a".into() }).unwrap();
        assert_eq!(json["type"], "stream_chunk");
        assert_eq!(json["content"], "a");
    }
}
