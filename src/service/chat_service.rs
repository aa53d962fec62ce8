use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::agent::prompt::PromptSource;
use crate::agent::CompletionService;
use crate::artifact::extract_artifacts;
use crate::db::ConversationStore;
use crate::errors::AppError;
use crate::models::{Actor, Chat, ChatMessage, ChatView, MessageRole, MessageView, NewMessage};
use crate::service::turn_guard::{RequestState, TurnGuard, TurnTicket};

const MAX_MESSAGE_LENGTH: usize = 8000;
const EVENT_BUFFER: usize = 64;

/// One item of a turn's output. `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnEvent {
    Delta(String),
    Completed { message_id: Option<Uuid>, content: String },
    Failed { reason: String },
}

/// Receiving end of a running turn.
#[derive(Debug)]
pub struct TurnStream {
    pub chat_id: i64,
    pub events: mpsc::Receiver<TurnEvent>,
}

#[derive(Clone)]
pub struct ChatService {
    store: Arc<dyn ConversationStore>,
    completion: Arc<dyn CompletionService>,
    prompts: Arc<dyn PromptSource>,
    turns: TurnGuard,
}

fn validate_content(field_name: &str, content: &str) -> Result<(), AppError> {
    if content.trim().is_empty() {
        return Err(AppError::EmptyField { field_name: field_name.to_string() });
    }
    if content.len() > MAX_MESSAGE_LENGTH {
        return Err(AppError::FieldTooLong {
            field_name: field_name.to_string(),
            max_length: MAX_MESSAGE_LENGTH,
            actual_length: content.len(),
        });
    }
    Ok(())
}

/// A fresh turn needs a non-empty history ending with the user's message.
fn validate_history(history: &[ChatMessage]) -> Result<&ChatMessage, AppError> {
    let last = history.last().ok_or_else(|| AppError::InvalidHistory {
        reason: "history is empty".to_string(),
    })?;
    if last.role != MessageRole::User {
        return Err(AppError::InvalidHistory {
            reason: format!("last message is from {}, expected user", last.role),
        });
    }
    validate_content("content", &last.content)?;
    Ok(last)
}

impl ChatService {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        completion: Arc<dyn CompletionService>,
        prompts: Arc<dyn PromptSource>,
    ) -> Self {
        Self { store, completion, prompts, turns: TurnGuard::new() }
    }

    pub fn turn_state(&self, chat_id: i64) -> RequestState {
        self.turns.state(chat_id)
    }

    /// Starts a conversation from the builder page: a new chat owned by the
    /// actor, holding the description as its first user message.
    pub async fn create_chat(&self, actor: Option<Actor>, prompt: &str) -> Result<Chat, AppError> {
        let actor = actor.ok_or(AppError::Unauthenticated)?;
        validate_content("prompt", prompt)?;

        let chat = self.store.create_chat(actor.user_id).await?;
        self.store
            .insert_user_message_if_absent(&NewMessage::user(chat.id, actor.user_id, prompt.trim()))
            .await?;

        info!("Created chat {} for {}", chat.public_id, actor.user_id);
        Ok(chat)
    }

    /// Loads a conversation for display, with artifacts derived per assistant message.
    pub async fn get_chat(&self, public_id: Uuid) -> Result<ChatView, AppError> {
        let chat = self
            .store
            .find_chat_by_public_id(public_id)
            .await?
            .filter(|c| !c.is_deleted())
            .ok_or_else(|| AppError::ChatNotFound { id: public_id.to_string() })?;

        let messages = self.store.list_messages(chat.id).await?;
        if messages.is_empty() {
            return Err(AppError::NoMessages { id: public_id.to_string() });
        }

        let messages = messages
            .iter()
            .map(|m| MessageView {
                role: m.role(),
                artifacts: match m.role() {
                    MessageRole::Assistant => extract_artifacts(&m.content),
                    MessageRole::User => Vec::new(),
                },
                content: m.content.clone(),
            })
            .collect();

        Ok(ChatView { chat_id: chat.id, public_id: chat.public_id, messages })
    }

    /// Runs one turn: stores the user's message if it is new, streams the
    /// model's reply, then stores the reply as a single assistant message.
    ///
    /// Errors returned here abort the turn before anything is generated.
    /// Once the stream is handed back, every outcome arrives as a [`TurnEvent`].
    pub async fn continue_conversation(
        &self,
        actor: Option<Actor>,
        chat_id: i64,
        history: Vec<ChatMessage>,
    ) -> Result<TurnStream, AppError> {
        let actor = actor.ok_or(AppError::Unauthenticated)?;
        let last = validate_history(&history)?;

        match self.store.find_chat_by_id(chat_id).await {
            Ok(Some(chat)) if !chat.is_deleted() => {}
            Ok(_) => return Err(AppError::ChatNotFound { id: chat_id.to_string() }),
            Err(e) => warn!("Could not verify chat {chat_id}, continuing: {e}"),
        }

        let mut ticket = self.turns.begin(chat_id)?;
        let system = self.prompts.system_prompt().await?;

        let user_message = NewMessage::user(chat_id, actor.user_id, last.content.clone());
        let inserted_user_message = match self.store.insert_user_message_if_absent(&user_message).await {
            Ok(Some(row)) => Some(row.id),
            Ok(None) => {
                debug!("User message already stored for chat {chat_id}");
                None
            }
            Err(e) => {
                error!("Error saving user message for chat {chat_id}: {e}");
                None
            }
        };

        ticket.streaming()?;
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let relay = TurnRelay {
            store: self.store.clone(),
            completion: self.completion.clone(),
            chat_id,
            actor,
            system,
            history,
            inserted_user_message,
        };
        tokio::spawn(relay.run(ticket, tx));

        Ok(TurnStream { chat_id, events: rx })
    }
}

/// Owned state of a turn after it has been accepted.
struct TurnRelay {
    store: Arc<dyn ConversationStore>,
    completion: Arc<dyn CompletionService>,
    chat_id: i64,
    actor: Actor,
    system: String,
    history: Vec<ChatMessage>,
    inserted_user_message: Option<i64>,
}

impl TurnRelay {
    async fn run(self, ticket: TurnTicket, events: mpsc::Sender<TurnEvent>) {
        let (delta_tx, mut delta_rx) = mpsc::channel::<String>(EVENT_BUFFER);
        let completion = self.completion.clone();
        let system = self.system.clone();
        let history = self.history.clone();
        let producer = tokio::spawn(async move {
            completion.stream_completion(&system, &history, delta_tx).await
        });

        // Keep draining after the caller leaves so the reply is still stored.
        let mut full_content = String::new();
        let mut listening = true;
        while let Some(delta) = delta_rx.recv().await {
            full_content.push_str(&delta);
            if listening && events.send(TurnEvent::Delta(delta)).await.is_err() {
                debug!("Caller left chat {}; finishing turn in background", self.chat_id);
                listening = false;
            }
        }

        let outcome = match producer.await {
            Ok(result) => result,
            Err(e) => Err(AppError::Unexpected(format!("completion task failed: {e}"))),
        };

        let terminal = match outcome {
            Ok(()) => self.persist_reply(full_content).await,
            Err(e) => self.roll_back(e).await,
        };

        // Release the conversation before the caller can react to the result.
        let state = ticket.finish();
        debug!("Chat {} is {}", self.chat_id, state.as_str());

        if listening {
            let _ = events.send(terminal).await;
        }
    }

    async fn persist_reply(&self, content: String) -> TurnEvent {
        let reply = NewMessage::assistant(self.chat_id, self.actor.user_id, content.clone());
        let message_id = match self.store.upsert_message(&reply).await {
            Ok(row) => Some(row.public_id),
            Err(e) => {
                error!("Error saving assistant message for chat {}: {e}", self.chat_id);
                None
            }
        };
        TurnEvent::Completed { message_id, content }
    }

    async fn roll_back(&self, cause: AppError) -> TurnEvent {
        error!("Completion failed for chat {}: {cause}", self.chat_id);
        if let Some(id) = self.inserted_user_message {
            if let Err(e) = self.store.soft_delete_message(id).await {
                error!("Failed to roll back user message {id}: {e}");
            }
        }
        TurnEvent::Failed { reason: cause.to_string() }
    }
}
