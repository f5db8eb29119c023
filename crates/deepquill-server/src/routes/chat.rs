//! Conversational chat streaming route.

use std::sync::Arc;

use axum::extract::State;
use axum::response::sse::Sse;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::debug;

use crate::routes::{sse_from_flow, SseStream};
use crate::state::AppState;
use deepquill_genai::{chat_response_stream, ChatTurn};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/chat/stream", post(stream_chat))
}

/// Incoming chat request from the front-end.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatStreamRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<ChatTurn>,
}

async fn stream_chat(
    State(_state): State<Arc<AppState>>,
    Json(req): Json<ChatStreamRequest>,
) -> Sse<SseStream> {
    debug!(history_len = req.history.len(), "chat stream requested");
    sse_from_flow(chat_response_stream(req.history, req.message))
}
