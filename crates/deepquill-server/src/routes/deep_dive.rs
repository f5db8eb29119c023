//! Deep-dive analysis streaming route (multipart: message + optional file).

use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::response::sse::Sse;
use axum::routing::post;
use axum::Router;
use tracing::{debug, warn};

use crate::routes::{sse_from_flow, SseStream};
use crate::state::AppState;
use deepquill_genai::{deep_dive_response_stream, AttachedFile};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/deepdive/stream", post(stream_deep_dive))
}

async fn stream_deep_dive(
    State(_state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Sse<SseStream> {
    let mut message = String::new();
    let mut file: Option<AttachedFile> = None;

    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("message") => {
                message = field.text().await.unwrap_or_default();
            }
            Some("file") => {
                let file_name = field
                    .file_name()
                    .unwrap_or("attachment")
                    .to_string();
                let mime_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                match field.bytes().await {
                    Ok(bytes) => {
                        file = Some(AttachedFile::new(file_name, mime_type, bytes.to_vec()));
                    }
                    Err(e) => warn!("failed to read uploaded file: {}", e),
                }
            }
            other => {
                debug!("ignoring unknown multipart field: {:?}", other);
            }
        }
    }

    debug!(
        has_file = file.is_some(),
        message_len = message.len(),
        "deep-dive stream requested"
    );
    sse_from_flow(deep_dive_response_stream(message, file))
}
