// src/services/chat_store.rs
//! Chat persistence seam plus the two backends that need no external service.

use crate::models::chat::{first_user_message, ChatPreview, Message, Role, MAX_CHAT_LIST};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Storage request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Storage service returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("Unexpected stored data: {0}")]
    Decode(String),
    #[error("Chat {0} does not exist")]
    ChatNotFound(String),
    #[error("Messages cannot be stored with role {0}")]
    UnstorableRole(Role),
}

/// Row-level chat persistence.
///
/// An empty result means there is no data; failures are always `Err`.
#[async_trait]
pub trait ChatStore: Send + Sync {
    /// Creates a chat owned by `user_id` and returns its id.
    async fn create_chat(&self, user_id: &str) -> Result<String, StorageError>;

    async fn add_message(&self, chat_id: &str, role: Role, content: &str) -> Result<(), StorageError>;

    /// Messages of a chat in creation order. Unknown chats yield an empty list.
    async fn get_messages(&self, chat_id: &str) -> Result<Vec<Message>, StorageError>;

    /// Owning user of a chat, `None` when the chat is unknown.
    async fn chat_owner(&self, chat_id: &str) -> Result<Option<String>, StorageError>;

    /// Newest-first previews of a user's chats; `limit` is capped at `MAX_CHAT_LIST`.
    async fn list_chats(&self, user_id: &str, limit: usize) -> Result<Vec<ChatPreview>, StorageError>;

    /// False when writes are discarded, so unknown chats cannot be told apart from unsaved ones.
    fn persists(&self) -> bool {
        true
    }
}

pub fn new_chat_id() -> String {
    Uuid::new_v4().to_string()
}

pub fn clamp_limit(limit: usize) -> usize {
    limit.min(MAX_CHAT_LIST)
}

/// Only user and assistant turns are persisted; the system instruction never is.
pub fn ensure_storable(role: Role) -> Result<(), StorageError> {
    match role {
        Role::User | Role::Assistant => Ok(()),
        Role::System => Err(StorageError::UnstorableRole(role)),
    }
}

/// Used when no storage credentials are configured: nothing is saved and every read is empty.
#[derive(Debug, Default, Clone)]
pub struct DisabledStore;

#[async_trait]
impl ChatStore for DisabledStore {
    async fn create_chat(&self, _user_id: &str) -> Result<String, StorageError> {
        Ok(new_chat_id())
    }

    async fn add_message(&self, _chat_id: &str, _role: Role, _content: &str) -> Result<(), StorageError> {
        Ok(())
    }

    async fn get_messages(&self, _chat_id: &str) -> Result<Vec<Message>, StorageError> {
        Ok(Vec::new())
    }

    async fn chat_owner(&self, _chat_id: &str) -> Result<Option<String>, StorageError> {
        Ok(None)
    }

    async fn list_chats(&self, _user_id: &str, _limit: usize) -> Result<Vec<ChatPreview>, StorageError> {
        Ok(Vec::new())
    }

    fn persists(&self) -> bool {
        false
    }
}

#[derive(Debug)]
struct StoredChat {
    user_id: String,
    created_at: chrono::DateTime<Utc>,
    seq: u64,
    // Insertion order doubles as the tie-breaker for equal timestamps
    messages: Vec<Message>,
}

/// Process-local store for development runs and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    chats: RwLock<HashMap<String, StoredChat>>,
    next_seq: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChatStore for MemoryStore {
    async fn create_chat(&self, user_id: &str) -> Result<String, StorageError> {
        let id = new_chat_id();
        self.chats.write().await.insert(
            id.clone(),
            StoredChat {
                user_id: user_id.to_string(),
                created_at: Utc::now(),
                seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
                messages: Vec::new(),
            },
        );
        Ok(id)
    }

    async fn add_message(&self, chat_id: &str, role: Role, content: &str) -> Result<(), StorageError> {
        ensure_storable(role)?;
        let mut chats = self.chats.write().await;
        let chat = chats
            .get_mut(chat_id)
            .ok_or_else(|| StorageError::ChatNotFound(chat_id.to_string()))?;
        chat.messages.push(Message {
            id: Uuid::new_v4().to_string(),
            chat_id: chat_id.to_string(),
            role,
            content: content.to_string(),
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn get_messages(&self, chat_id: &str) -> Result<Vec<Message>, StorageError> {
        let chats = self.chats.read().await;
        let mut messages = chats
            .get(chat_id)
            .map(|chat| chat.messages.clone())
            .unwrap_or_default();
        // Stable sort keeps insertion order for equal timestamps
        messages.sort_by_key(|m| m.created_at);
        Ok(messages)
    }

    async fn chat_owner(&self, chat_id: &str) -> Result<Option<String>, StorageError> {
        Ok(self.chats.read().await.get(chat_id).map(|c| c.user_id.clone()))
    }

    async fn list_chats(&self, user_id: &str, limit: usize) -> Result<Vec<ChatPreview>, StorageError> {
        let chats = self.chats.read().await;
        let mut owned: Vec<(&String, &StoredChat)> =
            chats.iter().filter(|(_, chat)| chat.user_id == user_id).collect();
        owned.sort_by(|a, b| (b.1.created_at, b.1.seq).cmp(&(a.1.created_at, a.1.seq)));

        Ok(owned
            .into_iter()
            .take(clamp_limit(limit))
            .map(|(id, chat)| {
                let title = first_user_message(chat.messages.iter().map(|m| (m.role, m.content.as_str())));
                ChatPreview::new(id.clone(), chat.created_at, title)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::chat::UNTITLED_CHAT;

    #[tokio::test]
    async fn test_disabled_store_degrades_to_empty() {
        let store = DisabledStore;
        let id = store.create_chat("u1").await.unwrap();
        assert!(Uuid::parse_str(&id).is_ok());
        store.add_message(&id, Role::User, "hello").await.unwrap();
        assert!(store.get_messages(&id).await.unwrap().is_empty());
        assert!(store.list_chats("u1", 20).await.unwrap().is_empty());
        assert_eq!(store.chat_owner(&id).await.unwrap(), None);
        assert!(!store.persists());
    }

    #[tokio::test]
    async fn test_memory_store_keeps_insertion_order() {
        let store = MemoryStore::new();
        let id = store.create_chat("u1").await.unwrap();
        store.add_message(&id, Role::User, "first").await.unwrap();
        store.add_message(&id, Role::Assistant, "second").await.unwrap();
        store.add_message(&id, Role::User, "third").await.unwrap();

        let contents: Vec<String> = store
            .get_messages(&id)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.content)
            .collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
        assert_eq!(store.chat_owner(&id).await.unwrap().as_deref(), Some("u1"));
    }

    #[tokio::test]
    async fn test_memory_store_rejects_messages_for_unknown_chat() {
        let store = MemoryStore::new();
        let err = store.add_message("missing", Role::User, "x").await.unwrap_err();
        assert!(matches!(err, StorageError::ChatNotFound(ref id) if id == "missing"));
        assert!(store.get_messages("missing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_memory_store_refuses_system_turns() {
        let store = MemoryStore::new();
        let id = store.create_chat("u1").await.unwrap();
        let err = store.add_message(&id, Role::System, "instruction").await.unwrap_err();
        assert!(matches!(err, StorageError::UnstorableRole(Role::System)));
        assert!(store.get_messages(&id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_memory_store_listing_order_is_stable_for_rapid_creates() {
        let store = MemoryStore::new();
        let mut created = Vec::new();
        for _ in 0..10 {
            created.push(store.create_chat("u1").await.unwrap());
        }
        created.reverse();

        for _ in 0..3 {
            let listed: Vec<String> = store
                .list_chats("u1", 20)
                .await
                .unwrap()
                .into_iter()
                .map(|c| c.id)
                .collect();
            assert_eq!(listed, created);
        }
    }

    #[tokio::test]
    async fn test_memory_store_lists_newest_first_with_titles() {
        let store = MemoryStore::new();
        let older = store.create_chat("u1").await.unwrap();
        store.add_message(&older, Role::User, "older prompt").await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let newer = store.create_chat("u1").await.unwrap();
        store.create_chat("u2").await.unwrap();

        let chats = store.list_chats("u1", 20).await.unwrap();
        assert_eq!(chats.len(), 2);
        assert_eq!(chats[0].id, newer);
        assert_eq!(chats[0].title, UNTITLED_CHAT);
        assert_eq!(chats[1].id, older);
        assert_eq!(chats[1].title, "older prompt");
    }

    #[tokio::test]
    async fn test_memory_store_caps_listing() {
        let store = MemoryStore::new();
        for _ in 0..25 {
            store.create_chat("u1").await.unwrap();
        }
        assert_eq!(store.list_chats("u1", 100).await.unwrap().len(), MAX_CHAT_LIST);
        assert_eq!(store.list_chats("u1", 3).await.unwrap().len(), 3);
    }
}
