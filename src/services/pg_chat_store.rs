// src/services/pg_chat_store.rs
use crate::models::chat::{ChatPreview, Message, Role};
use crate::services::chat_store::{clamp_limit, ensure_storable, new_chat_id, ChatStore, StorageError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

#[derive(Debug, FromRow)]
struct MessageRow {
    id: String,
    chat_id: String,
    role: String,
    content: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<MessageRow> for Message {
    type Error = StorageError;

    fn try_from(row: MessageRow) -> Result<Self, Self::Error> {
        Ok(Message {
            role: row.role.parse().map_err(StorageError::Decode)?,
            id: row.id,
            chat_id: row.chat_id,
            content: row.content,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct PreviewRow {
    id: String,
    created_at: DateTime<Utc>,
    first_user_message: Option<String>,
}

/// Chat persistence straight against Postgres.
#[derive(Debug, Clone)]
pub struct PgChatStore {
    db_pool: PgPool,
}

impl PgChatStore {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl ChatStore for PgChatStore {
    async fn create_chat(&self, user_id: &str) -> Result<String, StorageError> {
        let chat_id = new_chat_id();
        sqlx::query("INSERT INTO chats (id, user_id) VALUES ($1, $2)")
            .bind(&chat_id)
            .bind(user_id)
            .execute(&self.db_pool)
            .await?;
        tracing::debug!(chat_id = %chat_id, user_id = %user_id, "created chat");
        Ok(chat_id)
    }

    async fn add_message(&self, chat_id: &str, role: Role, content: &str) -> Result<(), StorageError> {
        ensure_storable(role)?;
        sqlx::query("INSERT INTO messages (id, chat_id, role, content) VALUES ($1, $2, $3, $4)")
            .bind(Uuid::new_v4().to_string())
            .bind(chat_id)
            .bind(role.as_str())
            .bind(content)
            .execute(&self.db_pool)
            .await?;
        Ok(())
    }

    async fn get_messages(&self, chat_id: &str) -> Result<Vec<Message>, StorageError> {
        let rows = sqlx::query_as::<_, MessageRow>(
            r#"
            SELECT id, chat_id, role, content, created_at
            FROM messages
            WHERE chat_id = $1
            ORDER BY created_at ASC, seq ASC
            "#,
        )
        .bind(chat_id)
        .fetch_all(&self.db_pool)
        .await?;

        rows.into_iter().map(Message::try_from).collect()
    }

    async fn chat_owner(&self, chat_id: &str) -> Result<Option<String>, StorageError> {
        let owner = sqlx::query_scalar::<_, String>("SELECT user_id FROM chats WHERE id = $1")
            .bind(chat_id)
            .fetch_optional(&self.db_pool)
            .await?;
        Ok(owner)
    }

    async fn list_chats(&self, user_id: &str, limit: usize) -> Result<Vec<ChatPreview>, StorageError> {
        let rows = sqlx::query_as::<_, PreviewRow>(
            r#"
            SELECT c.id, c.created_at,
                (SELECT m.content FROM messages m
                 WHERE m.chat_id = c.id AND m.role = 'user'
                 ORDER BY m.created_at ASC, m.seq ASC
                 LIMIT 1) AS first_user_message
            FROM chats c
            WHERE c.user_id = $1
            ORDER BY c.created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(clamp_limit(limit) as i64)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| ChatPreview::new(row.id, row.created_at, row.first_user_message))
            .collect())
    }
}
