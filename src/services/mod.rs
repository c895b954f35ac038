// src/services/mod.rs
pub mod chat_store;
pub mod pg_chat_store;
pub mod refinement;

pub use chat_store::{ChatStore, DisabledStore, MemoryStore, StorageError};
pub use pg_chat_store::PgChatStore;
pub use refinement::{PromptRefiner, RefineError, UnconfiguredRefiner};

use crate::config::{Config, StoreConfig};
use crate::db;
use crate::groq_client::GroqClient;
use crate::supabase_client::SupabaseClient;
use std::sync::Arc;

/// Picks the completion backend for the configured credential.
pub fn build_refiner(config: &Config) -> Arc<dyn PromptRefiner> {
    match config.groq {
        Some(ref groq) => {
            let client = GroqClient::new(groq);
            tracing::info!("Initializing Groq client (model {})...", client.model());
            Arc::new(client)
        }
        None => {
            tracing::warn!("GROQ_API_KEY not found. Prompt refinement will return errors.");
            Arc::new(UnconfiguredRefiner)
        }
    }
}

/// Connects the configured chat store. Postgres runs migrations here.
pub async fn build_store(config: &StoreConfig) -> Result<Arc<dyn ChatStore>, StorageError> {
    let store: Arc<dyn ChatStore> = match config {
        StoreConfig::Memory => {
            tracing::info!("Using in-memory chat store; chats are lost on restart");
            Arc::new(MemoryStore::new())
        }
        StoreConfig::Postgres { database_url } => {
            tracing::info!("Connecting to Postgres chat store...");
            Arc::new(PgChatStore::new(db::create_pool(database_url).await?))
        }
        StoreConfig::Supabase { url, key, timeout } => {
            tracing::info!("Using Supabase chat store at {}", url);
            Arc::new(SupabaseClient::new(url, key.clone(), *timeout))
        }
        StoreConfig::Disabled => {
            tracing::warn!("No storage credentials found. Chats will not be persisted.");
            tracing::info!("To enable persistence, set: DATABASE_URL, or SUPABASE_URL and SUPABASE_KEY");
            Arc::new(DisabledStore)
        }
    };
    Ok(store)
}
