//! HTTP route handlers for the front-end API surface.

pub mod chat;
pub mod deep_dive;
pub mod status;

use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;

use axum::response::sse::{Event, Sse};
use axum::Router;
use futures::Stream;
use tokio_stream::StreamExt;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use deepquill_genai::ChunkStream;

/// Build the main Axum router with all routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", api_routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(status::routes())
        .merge(chat::routes())
        .merge(deep_dive::routes())
}

pub(crate) type SseStream = Pin<Box<dyn Stream<Item = Result<Event, Infallible>> + Send>>;

/// Adapt a streaming flow into SSE: one data event per chunk, a `[DONE]`
/// marker at the end, and a single error event if the flow could not start.
pub(crate) fn sse_from_flow(flow: deepquill_core::Result<ChunkStream>) -> Sse<SseStream> {
    let stream: SseStream = match flow {
        Ok(chunks) => Box::pin(async_stream::stream! {
            let mut chunks = chunks;
            while let Some(chunk) = chunks.next().await {
                let payload = serde_json::to_string(&chunk)
                    .unwrap_or_else(|_| String::from("{}"));
                yield Ok::<_, Infallible>(Event::default().data(payload));
            }
            yield Ok(Event::default().data("[DONE]".to_string()));
        }),
        Err(e) => Box::pin(async_stream::stream! {
            let payload = serde_json::json!({ "error": e.to_string() }).to_string();
            yield Ok::<_, Infallible>(Event::default().data(payload));
        }),
    };
    Sse::new(stream)
}
