use crate::models::chat::{first_user_message, ChatPreview, Message, Role};
use crate::services::chat_store::{clamp_limit, ensure_storable, new_chat_id, ChatStore, StorageError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Chat persistence through a hosted PostgREST (Supabase) endpoint.
#[derive(Debug, Clone)]
pub struct SupabaseClient {
    client: Client,
    rest_url: String,
    api_key: String,
    timeout: Duration,
}

#[derive(Debug, Serialize)]
struct NewChat<'a> {
    id: &'a str,
    user_id: &'a str,
}

#[derive(Debug, Serialize)]
struct NewMessage<'a> {
    id: String,
    chat_id: &'a str,
    role: Role,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct OwnerRow {
    user_id: String,
}

#[derive(Debug, Deserialize)]
struct ChatRow {
    id: String,
    created_at: DateTime<Utc>,
    #[serde(default)]
    messages: Vec<EmbeddedMessage>,
}

#[derive(Debug, Deserialize)]
struct EmbeddedMessage {
    role: Role,
    content: String,
    created_at: DateTime<Utc>,
    #[serde(default)]
    seq: i64,
}

impl SupabaseClient {
    pub fn new(url: &str, api_key: String, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            rest_url: format!("{}/rest/v1", url.trim_end_matches('/')),
            api_key,
            timeout,
        }
    }

    fn table(&self, method: Method, table: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}/{}", self.rest_url, table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
    }

    async fn insert<T: Serialize>(&self, table: &str, row: &T) -> Result<(), StorageError> {
        let response = self
            .table(Method::POST, table)
            .header("Prefer", "return=minimal")
            .json(row)
            .send()
            .await?;
        check_status(response).await.map(|_| ())
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, StorageError> {
        let response = self.table(Method::GET, table).query(query).send().await?;
        Ok(check_status(response).await?.json::<Vec<T>>().await?)
    }
}

async fn check_status(response: Response) -> Result<Response, StorageError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        let body = response.text().await.unwrap_or_default();
        Err(StorageError::Api { status: status.as_u16(), body })
    }
}

fn eq(value: &str) -> String {
    format!("eq.{}", value)
}

#[async_trait]
impl ChatStore for SupabaseClient {
    async fn create_chat(&self, user_id: &str) -> Result<String, StorageError> {
        let chat_id = new_chat_id();
        self.insert("chats", &NewChat { id: &chat_id, user_id }).await?;
        Ok(chat_id)
    }

    async fn add_message(&self, chat_id: &str, role: Role, content: &str) -> Result<(), StorageError> {
        ensure_storable(role)?;
        let row = NewMessage {
            id: Uuid::new_v4().to_string(),
            chat_id,
            role,
            content,
        };
        self.insert("messages", &row).await
    }

    async fn get_messages(&self, chat_id: &str) -> Result<Vec<Message>, StorageError> {
        self.select(
            "messages",
            &[
                ("select", "id,chat_id,role,content,created_at".to_string()),
                ("chat_id", eq(chat_id)),
                ("order", "created_at.asc,seq.asc".to_string()),
            ],
        )
        .await
    }

    async fn chat_owner(&self, chat_id: &str) -> Result<Option<String>, StorageError> {
        let rows: Vec<OwnerRow> = self
            .select(
                "chats",
                &[
                    ("select", "user_id".to_string()),
                    ("id", eq(chat_id)),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;
        Ok(rows.into_iter().next().map(|row| row.user_id))
    }

    async fn list_chats(&self, user_id: &str, limit: usize) -> Result<Vec<ChatPreview>, StorageError> {
        let rows: Vec<ChatRow> = self
            .select(
                "chats",
                &[
                    ("select", "id,created_at,messages(role,content,created_at,seq)".to_string()),
                    ("user_id", eq(user_id)),
                    ("order", "created_at.desc".to_string()),
                    ("limit", clamp_limit(limit).to_string()),
                    ("messages.order", "created_at.asc,seq.asc".to_string()),
                ],
            )
            .await?;

        Ok(rows
            .into_iter()
            .map(|mut row| {
                // Embedded ordering is not guaranteed by every PostgREST version
                row.messages.sort_by_key(|m| (m.created_at, m.seq));
                let title = first_user_message(row.messages.iter().map(|m| (m.role, m.content.as_str())));
                ChatPreview::new(row.id, row.created_at, title)
            })
            .collect())
    }
}
