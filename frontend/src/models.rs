use serde::{Deserialize, Serialize};

/// Matches the backend `Artifact`.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Artifact {
    pub title: String,
    pub language: String,
    pub content: String,
}

/// One history element, as sent to the backend.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Matches the backend `MessageView`.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct MessageView {
    pub role: String,
    pub content: String,
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
}

/// Matches the backend `ChatView`.
#[derive(Clone, Debug, Deserialize)]
pub struct ChatView {
    pub chat_id: i64,
    pub public_id: String,
    pub messages: Vec<MessageView>,
}

/// A message as rendered in the conversation pane.
#[derive(Clone, Debug, PartialEq)]
pub struct DisplayMessage {
    pub key: usize,
    pub role: String,
    pub content: String,
    pub artifacts: Vec<Artifact>,
    /// Part of a turn that failed; the server rolled it back.
    pub failed: bool,
}

impl DisplayMessage {
    pub fn new(key: usize, role: &str, content: String) -> Self {
        Self { key, role: role.to_string(), content, artifacts: Vec::new(), failed: false }
    }

    pub fn is_user(&self) -> bool {
        self.role == "user"
    }

    pub fn to_history(&self) -> ChatMessage {
        ChatMessage { role: self.role.clone(), content: self.content.clone() }
    }
}

/// History for the next turn. Failed turns were rolled back on the server,
/// so neither their user message nor their partial reply is sent again.
pub fn turn_history(messages: &[DisplayMessage]) -> Vec<ChatMessage> {
    messages
        .iter()
        .filter(|m| !m.failed)
        .map(DisplayMessage::to_history)
        .collect()
}

/// Marks a turn as failed: the user message it stored (if any) and the
/// partial reply, which is appended.
pub fn fail_turn(
    messages: &mut Vec<DisplayMessage>,
    user_key: Option<usize>,
    partial: Option<DisplayMessage>,
) {
    if let Some(key) = user_key {
        if let Some(sent) = messages.iter_mut().find(|m| m.key == key) {
            sent.failed = true;
        }
    }
    if let Some(mut partial) = partial {
        partial.failed = true;
        messages.push(partial);
    }
}

/// Request body for `POST /api/chats`.
#[derive(Clone, Debug, Serialize)]
pub struct CreateChatRequest {
    pub prompt: String,
}

/// Response from `POST /api/chats`.
#[derive(Clone, Debug, Deserialize)]
pub struct CreateChatResponse {
    pub chat_id: i64,
    pub public_id: String,
}

/// WebSocket request sent by the client.
#[derive(Clone, Debug, Serialize)]
pub struct WsChatRequest {
    pub chat_id: i64,
    pub history: Vec<ChatMessage>,
}

/// WebSocket event received from the server.
/// Matches the backend `WsEvent` enum (internally tagged).
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "type")]
pub enum WsEvent {
    #[serde(rename = "stream_start")]
    StreamStart { chat_id: i64 },
    #[serde(rename = "stream_chunk")]
    StreamChunk { content: String },
    #[serde(rename = "artifact")]
    Artifact { index: usize, artifact: Artifact },
    #[serde(rename = "stream_end")]
    StreamEnd {
        full_content: String,
        #[serde(default)]
        message_id: Option<String>,
    },
    #[serde(rename = "error")]
    Error { message: String },
}

/// Send state of the open conversation. Replaces a "sending" boolean so a
/// second submit is refused until the running turn ends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RequestState {
    #[default]
    Idle,
    Sending,
    Streaming,
}

impl RequestState {
    /// `Idle → Sending`, or `None` while a turn is running.
    pub fn begin_send(self) -> Option<Self> {
        match self {
            RequestState::Idle => Some(RequestState::Sending),
            _ => None,
        }
    }

    /// `Sending → Streaming`, or `None` when no turn was started.
    pub fn begin_streaming(self) -> Option<Self> {
        match self {
            RequestState::Idle => None,
            RequestState::Sending | RequestState::Streaming => Some(RequestState::Streaming),
        }
    }

    pub fn finish(self) -> Self {
        RequestState::Idle
    }

    pub fn is_busy(self) -> bool {
        self != RequestState::Idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_idle_may_send() {
        assert_eq!(RequestState::Idle.begin_send(), Some(RequestState::Sending));
        assert_eq!(RequestState::Sending.begin_send(), None);
        assert_eq!(RequestState::Streaming.begin_send(), None);
        assert_eq!(
            RequestState::Sending.begin_streaming(),
            Some(RequestState::Streaming)
        );
        assert_eq!(RequestState::Idle.begin_streaming(), None);
        assert_eq!(RequestState::Streaming.finish(), RequestState::Idle);
    }

    #[test]
    fn failed_turn_is_left_out_of_later_history() {
        let mut messages = vec![
            DisplayMessage::new(0, "user", "Write a welcome email".into()),
            DisplayMessage::new(1, "assistant", "Here it is".into()),
            DisplayMessage::new(2, "user", "Make it blue".into()),
        ];
        let partial = DisplayMessage::new(3, "assistant", "Sure, blu".into());
        fail_turn(&mut messages, Some(2), Some(partial));
        messages.push(DisplayMessage::new(4, "user", "Make it green".into()));

        let history = turn_history(&messages);
        let contents: Vec<&str> = history.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["Write a welcome email", "Here it is", "Make it green"]);
        assert_eq!(messages.len(), 5);
        assert!(messages[2].failed && messages[3].failed);
    }

    #[test]
    fn failed_first_reply_keeps_the_stored_prompt() {
        let mut messages = vec![DisplayMessage::new(0, "user", "Write a welcome email".into())];
        fail_turn(&mut messages, None, None);

        assert_eq!(turn_history(&messages).len(), 1);
        assert!(!messages[0].failed);
    }

    #[test]
    fn parses_artifact_event() {
        let json = r#"{"type":"artifact","index":0,"artifact":{"title":"Subject Line","language":"text","content":"Welcome aboard!"}}"#;
        match serde_json::from_str::<WsEvent>(json).unwrap() {
            WsEvent::Artifact { index, artifact } => {
                assert_eq!(index, 0);
                assert_eq!(artifact.title, "Subject Line");
            }
            other => panic!("unexpected event {other:?}"),
        }
    }
}
