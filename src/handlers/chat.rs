// src/handlers/chat.rs
//! Chat endpoints: refine a new prompt, continue a chat, read history, list chats.

use crate::handlers::error::AppError;
use crate::middleware::user_id::UserId;
use crate::models::chat::{
    ChatHistoryResponse, ChatListResponse, ChatTurn, CreateChatRequest, CreateMessageRequest,
    RefinementResponse, Role, MAX_CHAT_LIST,
};
use crate::services::refinement::{refinement_conversation, RefineError};
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;
use std::sync::Arc;

pub fn chat_routes() -> Router {
    Router::new()
        .route("/chat", post(create_chat))
        .route("/chat/:chat_id", get(get_chat_history))
        .route("/chat/:chat_id/message", post(continue_chat))
        .route("/chats", get(list_chats))
}

fn require_content(content: &str) -> Result<(), AppError> {
    if content.trim().is_empty() {
        return Err(AppError::EmptyContent);
    }
    Ok(())
}

/// POST /chat - Refine a first prompt and open a chat for it
async fn create_chat(
    user_id: UserId,
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<Json<CreateChatRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let user_id = user_id.0.ok_or(AppError::MissingUserId)?;
    let Json(request) = payload?;
    require_content(&request.content)?;

    let conversation = refinement_conversation(&[], &request.content);
    let optimized_prompt = match state.refiner.refine(&conversation).await {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(user_id = %user_id, "Refinement failed, no chat created: {}", e);
            return Ok(refinement_failed(&e, true));
        }
    };

    let chat_id = state.store.create_chat(&user_id).await?;
    state.store.add_message(&chat_id, Role::User, &request.content).await?;
    state.store.add_message(&chat_id, Role::Assistant, &optimized_prompt).await?;

    tracing::info!(chat_id = %chat_id, user_id = %user_id, "Created chat");

    Ok(Json(RefinementResponse { chat_id, optimized_prompt }).into_response())
}

/// GET /chat/:chat_id - All messages of a chat, oldest first
async fn get_chat_history(
    Path(chat_id): Path<String>,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<ChatHistoryResponse>, AppError> {
    let messages = state.store.get_messages(&chat_id).await?;
    Ok(Json(ChatHistoryResponse { messages }))
}

/// POST /chat/:chat_id/message - Refine again with the chat so far as context
async fn continue_chat(
    Path(chat_id): Path<String>,
    user_id: UserId,
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<Json<CreateMessageRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(request) = payload?;
    require_content(&request.content)?;

    // Without saved chats there is no owner to check against
    if state.store.persists() {
        let caller = user_id.as_deref().ok_or(AppError::MissingUserId)?;
        match state.store.chat_owner(&chat_id).await? {
            None => return Err(AppError::ChatNotFound(chat_id)),
            Some(owner) if owner != caller => {
                tracing::warn!(chat_id = %chat_id, user_id = %caller, "Rejected continuation of another user's chat");
                return Err(AppError::ForeignChat(chat_id));
            }
            Some(_) => {}
        }
    }

    let history: Vec<ChatTurn> = state
        .store
        .get_messages(&chat_id)
        .await?
        .iter()
        .map(ChatTurn::from)
        .collect();
    let conversation = refinement_conversation(&history, &request.content);

    let optimized_prompt = match state.refiner.refine(&conversation).await {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(chat_id = %chat_id, "Refinement failed: {}", e);
            return Ok(refinement_failed(&e, false));
        }
    };

    state.store.add_message(&chat_id, Role::User, &request.content).await?;
    state.store.add_message(&chat_id, Role::Assistant, &optimized_prompt).await?;

    Ok(Json(RefinementResponse { chat_id, optimized_prompt }).into_response())
}

/// GET /chats - The caller's most recent chats with preview titles
async fn list_chats(
    user_id: UserId,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<ChatListResponse>, AppError> {
    let chats = match user_id.as_deref() {
        Some(user_id) => state.store.list_chats(user_id, MAX_CHAT_LIST).await?,
        None => Vec::new(),
    };
    Ok(Json(ChatListResponse { chats }))
}

fn refinement_failed(err: &RefineError, with_chat_id: bool) -> Response {
    let body = if with_chat_id {
        json!({ "error": err.client_message(), "chat_id": null })
    } else {
        json!({ "error": err.client_message() })
    };
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}
