pub mod chat_repository;
pub mod message_repository;

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{Chat, Message, NewMessage};

use self::chat_repository::ChatRepository;
use self::message_repository::MessageRepository;

/// Persistence seam used by the chat service.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn create_chat(&self, owner: Uuid) -> Result<Chat, AppError>;

    async fn find_chat_by_id(&self, id: i64) -> Result<Option<Chat>, AppError>;

    async fn find_chat_by_public_id(&self, public_id: Uuid) -> Result<Option<Chat>, AppError>;

    /// Live (not soft-deleted) messages of a chat, oldest first.
    async fn list_messages(&self, chat_id: i64) -> Result<Vec<Message>, AppError>;

    /// Inserts a user message unless it repeats the chat's latest live user
    /// message. Returns the row only when inserted. Concurrent callers on one
    /// chat are serialized, so a double submit stores a single row.
    async fn insert_user_message_if_absent(
        &self,
        message: &NewMessage,
    ) -> Result<Option<Message>, AppError>;

    /// Inserts the message, or replaces the content of the row with the same public id.
    async fn upsert_message(&self, message: &NewMessage) -> Result<Message, AppError>;

    async fn soft_delete_message(&self, id: i64) -> Result<(), AppError>;
}

/// PostgreSQL-backed store combining the chat and message repositories.
#[derive(Clone)]
pub struct PgConversationStore {
    chats: ChatRepository,
    messages: MessageRepository,
}

impl PgConversationStore {
    pub fn new(chats: ChatRepository, messages: MessageRepository) -> Self {
        Self { chats, messages }
    }
}

#[async_trait]
impl ConversationStore for PgConversationStore {
    async fn create_chat(&self, owner: Uuid) -> Result<Chat, AppError> {
        self.chats.create(owner).await
    }

    async fn find_chat_by_id(&self, id: i64) -> Result<Option<Chat>, AppError> {
        self.chats.find_by_id(id).await
    }

    async fn find_chat_by_public_id(&self, public_id: Uuid) -> Result<Option<Chat>, AppError> {
        self.chats.find_by_public_id(public_id).await
    }

    async fn list_messages(&self, chat_id: i64) -> Result<Vec<Message>, AppError> {
        self.messages.find_by_chat_id(chat_id).await
    }

    async fn insert_user_message_if_absent(
        &self,
        message: &NewMessage,
    ) -> Result<Option<Message>, AppError> {
        self.messages.insert_if_absent(message).await
    }

    async fn upsert_message(&self, message: &NewMessage) -> Result<Message, AppError> {
        self.messages.upsert(message).await
    }

    async fn soft_delete_message(&self, id: i64) -> Result<(), AppError> {
        self.messages.soft_delete(id).await
    }
}
