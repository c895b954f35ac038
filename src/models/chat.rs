// src/models/chat.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Title shown in the chat list when a chat has no user message yet.
pub const UNTITLED_CHAT: &str = "Untitled Refinement";

/// Most chats ever returned by a single listing.
pub const MAX_CHAT_LIST: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "system" => Ok(Role::System),
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            other => Err(format!("unknown message role: {}", other)),
        }
    }
}

/// A stored turn of a chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub chat_id: String,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// One row of the chat list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatPreview {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub title: String,
}

impl ChatPreview {
    pub fn new(id: String, created_at: DateTime<Utc>, first_user_message: Option<String>) -> Self {
        Self {
            id,
            created_at,
            title: first_user_message.unwrap_or_else(|| UNTITLED_CHAT.to_string()),
        }
    }
}

/// Role and content only: what gets replayed to the completion service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self { role, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }
}

impl From<&Message> for ChatTurn {
    fn from(message: &Message) -> Self {
        ChatTurn::new(message.role, message.content.clone())
    }
}

/// Content of the earliest user turn, given turns in creation order.
pub fn first_user_message<'a, I>(turns: I) -> Option<String>
where
    I: IntoIterator<Item = (Role, &'a str)>,
{
    turns
        .into_iter()
        .find(|(role, _)| *role == Role::User)
        .map(|(_, content)| content.to_string())
}

// HTTP request/response bodies

#[derive(Debug, Deserialize)]
pub struct CreateChatRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateMessageRequest {
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RefinementResponse {
    pub chat_id: String,
    pub optimized_prompt: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatHistoryResponse {
    pub messages: Vec<Message>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatListResponse {
    pub chats: Vec<ChatPreview>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trips_through_str() {
        for role in [Role::System, Role::User, Role::Assistant] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("model".parse::<Role>().is_err());
    }

    #[test]
    fn test_preview_falls_back_without_user_message() {
        let now = Utc::now();
        let turns = vec![(Role::Assistant, "hello")];
        let preview = ChatPreview::new("c1".to_string(), now, first_user_message(turns));
        assert_eq!(preview.title, UNTITLED_CHAT);
    }

    #[test]
    fn test_preview_uses_first_user_message() {
        let turns = vec![
            (Role::Assistant, "greeting"),
            (Role::User, "todo app react"),
            (Role::User, "make it typed"),
        ];
        assert_eq!(first_user_message(turns).as_deref(), Some("todo app react"));
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let turn = ChatTurn::user("hi");
        let json = serde_json::to_value(&turn).unwrap();
        assert_eq!(json, serde_json::json!({"role": "user", "content": "hi"}));
    }
}
