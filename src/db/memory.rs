//! In-memory [`ConversationStore`] for service tests.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use uuid::Uuid;

use super::ConversationStore;
use crate::errors::AppError;
use crate::models::{Chat, Message, NewMessage};

#[derive(Default)]
struct Tables {
    chats: Vec<Chat>,
    messages: Vec<Message>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent write fail, to exercise the log-and-continue paths.
    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    /// Every row, including soft-deleted ones.
    pub fn all_messages(&self) -> Vec<Message> {
        self.tables.lock().messages.clone()
    }

    pub fn delete_chat(&self, id: i64) {
        if let Some(chat) = self.tables.lock().chats.iter_mut().find(|c| c.id == id) {
            chat.deleted_at = Some(Utc::now());
        }
    }

    fn check_writable(&self) -> Result<(), AppError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Unexpected("store is read-only".into()));
        }
        Ok(())
    }
}

fn row_from(tables: &Tables, message: &NewMessage) -> Message {
    Message {
        id: tables.messages.len() as i64 + 1,
        public_id: message.public_id,
        chat_id: message.chat_id,
        sent_by: message.sent_by,
        parent_message_id: None,
        content: message.content.clone(),
        is_user_message: message.is_user_message,
        created_at: Utc::now(),
        deleted_at: None,
        branch_number: 0,
    }
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn create_chat(&self, owner: Uuid) -> Result<Chat, AppError> {
        self.check_writable()?;
        let mut tables = self.tables.lock();
        let chat = Chat {
            id: tables.chats.len() as i64 + 1,
            public_id: Uuid::new_v4(),
            owned_by: owner,
            is_public: false,
            created_at: Utc::now(),
            deleted_at: None,
        };
        tables.chats.push(chat.clone());
        Ok(chat)
    }

    async fn find_chat_by_id(&self, id: i64) -> Result<Option<Chat>, AppError> {
        Ok(self.tables.lock().chats.iter().find(|c| c.id == id).cloned())
    }

    async fn find_chat_by_public_id(&self, public_id: Uuid) -> Result<Option<Chat>, AppError> {
        Ok(self
            .tables
            .lock()
            .chats
            .iter()
            .find(|c| c.public_id == public_id)
            .cloned())
    }

    async fn list_messages(&self, chat_id: i64) -> Result<Vec<Message>, AppError> {
        Ok(self
            .tables
            .lock()
            .messages
            .iter()
            .filter(|m| m.chat_id == chat_id && m.deleted_at.is_none())
            .cloned()
            .collect())
    }

    async fn insert_user_message_if_absent(
        &self,
        message: &NewMessage,
    ) -> Result<Option<Message>, AppError> {
        self.check_writable()?;
        let mut tables = self.tables.lock();
        let latest_user_message = tables
            .messages
            .iter()
            .rev()
            .find(|m| m.is_user_message && m.deleted_at.is_none() && m.chat_id == message.chat_id);
        if latest_user_message.is_some_and(|m| m.content == message.content) {
            return Ok(None);
        }
        let row = row_from(&tables, message);
        tables.messages.push(row.clone());
        Ok(Some(row))
    }

    async fn upsert_message(&self, message: &NewMessage) -> Result<Message, AppError> {
        self.check_writable()?;
        let mut tables = self.tables.lock();
        if let Some(existing) = tables
            .messages
            .iter_mut()
            .find(|m| m.public_id == message.public_id)
        {
            existing.content = message.content.clone();
            return Ok(existing.clone());
        }
        let row = row_from(&tables, message);
        tables.messages.push(row.clone());
        Ok(row)
    }

    async fn soft_delete_message(&self, id: i64) -> Result<(), AppError> {
        self.check_writable()?;
        if let Some(message) = self.tables.lock().messages.iter_mut().find(|m| m.id == id) {
            message.deleted_at.get_or_insert_with(Utc::now);
        }
        Ok(())
    }
}
