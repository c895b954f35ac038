// src/handlers/mod.rs
pub mod chat;
pub mod error;
pub mod health;

use crate::middleware::logging::request_logging_middleware;
use crate::AppState;
use axum::{Extension, Router};
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;

/// The full HTTP surface with its middleware stack.
pub fn app_router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(health::health_routes())
        .merge(chat::chat_routes())
        .layer(CatchPanicLayer::custom(error::handle_panic))
        .layer(axum::middleware::from_fn(request_logging_middleware))
        .layer(CorsLayer::permissive())
        .layer(Extension(state))
}
