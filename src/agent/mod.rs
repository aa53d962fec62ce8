pub mod prompt;

use async_trait::async_trait;
use futures_util::StreamExt;
use rig::agent::MultiTurnStreamItem;
use rig::message::Message as RigMessage;
use rig::prelude::CompletionClient;
use rig::providers::openai;
use rig::streaming::{StreamedAssistantContent, StreamingChat};
use tokio::sync::mpsc;
use tracing::{debug, error};

use crate::errors::AppError;
use crate::models::{ChatMessage, MessageRole};

/// Streaming text generation, seen from the relay.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Runs one completion over `history` (last element is the user's prompt)
    /// and sends each text delta to `tx` in order. Returns once the model
    /// signals end of stream, or with the error that interrupted it.
    async fn stream_completion(
        &self,
        system: &str,
        history: &[ChatMessage],
        tx: mpsc::Sender<String>,
    ) -> Result<(), AppError>;
}

/// Builds a rig [`RigMessage`] history list from the browser's history.
fn to_rig_history(messages: &[ChatMessage]) -> Vec<RigMessage> {
    messages
        .iter()
        .map(|m| match m.role {
            MessageRole::User => RigMessage::user(&m.content),
            MessageRole::Assistant => RigMessage::assistant(&m.content),
        })
        .collect()
}

/// Completion service backed by the rig [`openai::Client`].
/// A fresh agent is built per turn so the system prompt is always the latest fetched copy.
#[derive(Clone)]
pub struct RigCompletionService {
    client: openai::Client,
    model: String,
}

impl RigCompletionService {
    pub fn new(api_key: &str, base_url: Option<&str>, model: &str) -> Result<Self, AppError> {
        let mut builder = openai::Client::builder().api_key(api_key);
        if let Some(url) = base_url {
            builder = builder.base_url(url);
        }
        let client = builder.build().map_err(|e| AppError::CompletionUnavailable {
            message: format!("failed to build OpenAI client: {e}"),
        })?;
        Ok(Self { client, model: model.to_string() })
    }

    fn classify(&self, message: String) -> AppError {
        if message.contains("Connection refused") || message.contains("connect") {
            AppError::CompletionUnavailable { message }
        } else {
            AppError::InferenceError { message }
        }
    }
}

#[async_trait]
impl CompletionService for RigCompletionService {
    async fn stream_completion(
        &self,
        system: &str,
        history: &[ChatMessage],
        tx: mpsc::Sender<String>,
    ) -> Result<(), AppError> {
        let (prompt, earlier) = history.split_last().ok_or_else(|| AppError::InvalidHistory {
            reason: "history is empty".to_string(),
        })?;

        let agent = self.client.agent(&self.model).preamble(system).build();

        let mut stream = agent
            .stream_chat(prompt.content.as_str(), to_rig_history(earlier))
            .await;

        while let Some(item) = stream.next().await {
            match item {
                Ok(MultiTurnStreamItem::StreamAssistantItem(StreamedAssistantContent::Text(text))) => {
                    if tx.send(text.text).await.is_err() {
                        debug!("Delta receiver dropped; stopping completion stream");
                        break;
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    error!("Completion stream failed on model {}: {e}", self.model);
                    return Err(self.classify(e.to_string()));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;

    /// Replays a fixed list of deltas, optionally failing after them.
    pub struct ScriptedCompletion {
        pub deltas: Vec<String>,
        pub fail_with: Option<String>,
        pub seen_system: parking_lot::Mutex<Option<String>>,
        pub seen_history: parking_lot::Mutex<Vec<ChatMessage>>,
    }

    impl ScriptedCompletion {
        pub fn new(deltas: &[&str]) -> Self {
            Self {
                deltas: deltas.iter().map(|d| d.to_string()).collect(),
                fail_with: None,
                seen_system: parking_lot::Mutex::new(None),
                seen_history: parking_lot::Mutex::new(Vec::new()),
            }
        }

        pub fn failing_after(deltas: &[&str], reason: &str) -> Self {
            Self { fail_with: Some(reason.to_string()), ..Self::new(deltas) }
        }
    }

    #[async_trait]
    impl CompletionService for ScriptedCompletion {
        async fn stream_completion(
            &self,
            system: &str,
            history: &[ChatMessage],
            tx: mpsc::Sender<String>,
        ) -> Result<(), AppError> {
            *self.seen_system.lock() = Some(system.to_string());
            *self.seen_history.lock() = history.to_vec();
            for delta in &self.deltas {
                if tx.send(delta.clone()).await.is_err() {
                    break;
                }
                tokio::task::yield_now().await;
            }
            match &self.fail_with {
                Some(reason) => Err(AppError::InferenceError { message: reason.clone() }),
                None => Ok(()),
            }
        }
    }
}
