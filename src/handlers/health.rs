use axum::{response::Json, routing::get, Router};
use serde_json::{json, Value};

pub fn health_routes() -> Router {
    Router::new().route("/", get(health))
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "PromptRefinery Backend is running",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
