// lib.rs - Prompt refinement backend: HTTP surface, completion client and chat persistence
pub mod config;
pub mod db;
pub mod groq_client;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod supabase_client;

use services::{ChatStore, PromptRefiner};
use std::sync::Arc;

// AppState holds the completion backend and the chat store; both are chosen once at startup
pub struct AppState {
    pub refiner: Arc<dyn PromptRefiner>,
    pub store: Arc<dyn ChatStore>,
}

impl AppState {
    pub fn new(refiner: Arc<dyn PromptRefiner>, store: Arc<dyn ChatStore>) -> Self {
        Self { refiner, store }
    }
}

pub use config::Config;
pub use handlers::app_router;
