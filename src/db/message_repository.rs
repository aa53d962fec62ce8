use sqlx::PgPool;
use tracing::error;

use crate::errors::AppError;
use crate::models::{Message, NewMessage};

const MESSAGE_COLUMNS: &str = "id, public_id, chat_id, sent_by, parent_message_id, content, \
                               is_user_message, created_at, deleted_at, branch_number";

#[derive(Clone)]
pub struct MessageRepository {
    pool: PgPool,
}

impl MessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_chat_id(&self, chat_id: i64) -> Result<Vec<Message>, AppError> {
        sqlx::query_as::<_, Message>(&format!(
            "SELECT {MESSAGE_COLUMNS}
             FROM messages
             WHERE chat_id = $1 AND deleted_at IS NULL
             ORDER BY created_at ASC, id ASC"
        ))
        .bind(chat_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to fetch messages for chat {chat_id}: {e}");
            AppError::db_query(format!("Failed to fetch messages for chat {chat_id}"), e)
        })
    }

    /// Locks the chat row for the transaction so concurrent submits on one
    /// chat see each other's insert. Returns no row when the message repeats
    /// the chat's latest live user message.
    pub async fn insert_if_absent(&self, message: &NewMessage) -> Result<Option<Message>, AppError> {
        let chat_id = message.chat_id;
        let mut tx = self.pool.begin().await.map_err(|e| {
            error!("Failed to open transaction for chat {chat_id}: {e}");
            AppError::db_query("Failed to save user message", e)
        })?;

        sqlx::query("SELECT id FROM chats WHERE id = $1 FOR UPDATE")
            .bind(chat_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| {
                error!("Failed to lock chat {chat_id}: {e}");
                AppError::db_query("Failed to save user message", e)
            })?;

        let inserted = sqlx::query_as::<_, Message>(&format!(
            "INSERT INTO messages (public_id, chat_id, sent_by, content, is_user_message)
             SELECT $1, $2, $3, $4, TRUE
             WHERE NOT EXISTS (
                 SELECT 1
                 FROM (
                     SELECT content
                     FROM messages
                     WHERE chat_id = $2 AND is_user_message AND deleted_at IS NULL
                     ORDER BY created_at DESC, id DESC
                     LIMIT 1
                 ) latest
                 WHERE latest.content = $4
             )
             RETURNING {MESSAGE_COLUMNS}"
        ))
        .bind(message.public_id)
        .bind(chat_id)
        .bind(message.sent_by)
        .bind(&message.content)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            error!("Failed to save user message for chat {chat_id}: {e}");
            AppError::db_query("Failed to save user message", e)
        })?;

        tx.commit().await.map_err(|e| {
            error!("Failed to commit user message for chat {chat_id}: {e}");
            AppError::db_query("Failed to save user message", e)
        })?;
        Ok(inserted)
    }

    pub async fn upsert(&self, message: &NewMessage) -> Result<Message, AppError> {
        sqlx::query_as::<_, Message>(&format!(
            "INSERT INTO messages (public_id, chat_id, sent_by, content, is_user_message)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (public_id) DO UPDATE SET content = EXCLUDED.content
             RETURNING {MESSAGE_COLUMNS}"
        ))
        .bind(message.public_id)
        .bind(message.chat_id)
        .bind(message.sent_by)
        .bind(&message.content)
        .bind(message.is_user_message)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to save message {}: {e}", message.public_id);
            AppError::db_query("Failed to save message", e)
        })
    }

    pub async fn soft_delete(&self, id: i64) -> Result<(), AppError> {
        sqlx::query("UPDATE messages SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to soft-delete message {id}: {e}");
                AppError::db_query("Failed to delete message", e)
            })?;
        Ok(())
    }
}
