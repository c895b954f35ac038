// src/handlers/error.rs
use crate::services::StorageError;
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use std::any::Any;
use std::fmt::Display;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("X-User-ID header required")]
    MissingUserId,
    #[error("content must not be empty")]
    EmptyContent,
    #[error("{}", .0.body_text())]
    InvalidBody(#[from] JsonRejection),
    #[error("Chat {0} not found")]
    ChatNotFound(String),
    #[error("Chat {0} belongs to another user")]
    ForeignChat(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::MissingUserId | AppError::EmptyContent => StatusCode::BAD_REQUEST,
            AppError::InvalidBody(ref rejection) => rejection.status(),
            AppError::ChatNotFound(_) => StatusCode::NOT_FOUND,
            AppError::ForeignChat(_) => StatusCode::FORBIDDEN,
            AppError::Storage(ref err) => return internal_error(err),
        };
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

/// Renders any unexpected failure as `500 {detail, error: true}`.
pub fn internal_error(err: &dyn Display) -> Response {
    let error_id = Uuid::new_v4();

    tracing::error!(
        error_id = %error_id,
        error = %err,
        "unhandled error occurred"
    );

    // In production, don't expose internal error details
    let detail = if cfg!(debug_assertions) {
        format!("{} (ID: {})", err, error_id)
    } else {
        format!("Internal server error (ID: {})", error_id)
    };

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "detail": detail, "error": true })),
    )
        .into_response()
}

/// Panic hook for `CatchPanicLayer`.
pub fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "handler panicked".to_string()
    };
    internal_error(&message)
}
