use sqlx::PgPool;
use tracing::error;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::Chat;

const CHAT_COLUMNS: &str = "id, public_id, owned_by, is_public, created_at, deleted_at";

#[derive(Clone)]
pub struct ChatRepository {
    pool: PgPool,
}

impl ChatRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, owner: Uuid) -> Result<Chat, AppError> {
        sqlx::query_as::<_, Chat>(&format!(
            "INSERT INTO chats (public_id, owned_by) VALUES ($1, $2) RETURNING {CHAT_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(owner)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to create chat for {owner}: {e}");
            AppError::db_query("Failed to create chat", e)
        })
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Chat>, AppError> {
        sqlx::query_as::<_, Chat>(&format!("SELECT {CHAT_COLUMNS} FROM chats WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to find chat {id}: {e}");
                AppError::db_query(format!("Failed to find chat {id}"), e)
            })
    }

    pub async fn find_by_public_id(&self, public_id: Uuid) -> Result<Option<Chat>, AppError> {
        sqlx::query_as::<_, Chat>(&format!(
            "SELECT {CHAT_COLUMNS} FROM chats WHERE public_id = $1"
        ))
        .bind(public_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to find chat {public_id}: {e}");
            AppError::db_query(format!("Failed to find chat {public_id}"), e)
        })
    }
}
