// Shared helpers for integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use prompt_refinery::models::chat::ChatTurn;
use prompt_refinery::services::{PromptRefiner, RefineError};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Mutex;
use tower::ServiceExt;

/// Refiner that records every conversation it is asked about.
#[derive(Default)]
pub struct RecordingRefiner {
    pub calls: Mutex<Vec<Vec<ChatTurn>>>,
    pub fail: bool,
}

impl RecordingRefiner {
    pub fn failing() -> Self {
        Self { calls: Mutex::new(Vec::new()), fail: true }
    }

    pub fn calls(&self) -> Vec<Vec<ChatTurn>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PromptRefiner for RecordingRefiner {
    async fn refine(&self, conversation: &[ChatTurn]) -> Result<String, RefineError> {
        self.calls.lock().unwrap().push(conversation.to_vec());
        if self.fail {
            return Err(RefineError::MissingCredential);
        }
        let last = conversation.last().map(|t| t.content.as_str()).unwrap_or_default();
        Ok(format!("As a Senior Engineer, build: {}", last))
    }
}

pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, body)
}

pub fn get(uri: &str, user_id: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(user_id) = user_id {
        builder = builder.header("X-User-ID", user_id);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, user_id: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(user_id) = user_id {
        builder = builder.header("X-User-ID", user_id);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Serves `app` on an ephemeral local port.
pub async fn spawn_server(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}
