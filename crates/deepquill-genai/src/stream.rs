//! SSE consumption of the provider's streamed responses.
//!
//! The raw stream yields a tagged result per element so the error policy
//! stays explicit: downstream flows decide what an `Err` turns into.

use std::pin::Pin;

use futures::Stream;
use tokio_stream::StreamExt;
use tracing::debug;

use deepquill_core::{Error, Result};

use crate::types::{GroundingSource, ResponseChunk};
use crate::wire::{GenerateContentRequest, GenerateContentResponse};

/// Boxed stream of provider responses, one per `data:` line.
pub type RawEventStream = Pin<Box<dyn Stream<Item = Result<GenerateContentResponse>> + Send>>;

/// Issue the streaming request and parse SSE `data:` lines into responses.
///
/// Lazy: the request is sent on first poll. Transport failures, non-2xx
/// statuses, and read errors each yield a single `Err` and end the stream.
pub fn sse_event_stream(
    client: reqwest::Client,
    url: String,
    api_key: String,
    request: GenerateContentRequest,
) -> RawEventStream {
    Box::pin(async_stream::stream! {
        let response = match client
            .post(&url)
            .header("x-goog-api-key", &api_key)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                yield Err(Error::Http(format!("Request failed: {}", e)));
                return;
            }
        };

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            yield Err(Error::Api { status, message });
            return;
        }

        let mut stream = response.bytes_stream();
        let mut buffer = String::new();
        let mut pending = Vec::new();

        while let Some(chunk) = stream.next().await {
            let bytes = match chunk {
                Ok(b) => b,
                Err(e) => {
                    yield Err(Error::Stream(format!("Stream read error: {}", e)));
                    return;
                }
            };

            push_utf8_chunk(&mut buffer, &mut pending, &bytes);

            // Process complete SSE lines
            while let Some(line_end) = buffer.find('\n') {
                let line = buffer[..line_end].trim().to_string();
                buffer = buffer[line_end + 1..].to_string();

                if line.is_empty() || line.starts_with(':') {
                    continue;
                }

                if let Some(data) = line.strip_prefix("data: ") {
                    match serde_json::from_str::<GenerateContentResponse>(data) {
                        Ok(parsed) => yield Ok(parsed),
                        Err(e) => {
                            debug!("skipping unparseable stream payload: {}", e);
                        }
                    }
                }
            }
        }
    })
}

/// Append a network chunk to `text`, keeping a trailing incomplete UTF-8
/// sequence in `pending` so multi-byte characters split across chunk
/// boundaries decode intact. Truly invalid bytes become U+FFFD.
fn push_utf8_chunk(text: &mut String, pending: &mut Vec<u8>, bytes: &[u8]) {
    pending.extend_from_slice(bytes);
    loop {
        match std::str::from_utf8(pending) {
            Ok(s) => {
                text.push_str(s);
                pending.clear();
                return;
            }
            Err(e) => {
                let valid = e.valid_up_to();
                text.push_str(&String::from_utf8_lossy(&pending[..valid]));
                match e.error_len() {
                    Some(len) => {
                        text.push('\u{FFFD}');
                        pending.drain(..valid + len);
                    }
                    None => {
                        pending.drain(..valid);
                        return;
                    }
                }
            }
        }
    }
}

/// Project a provider response to the caller-facing chunk shape.
///
/// Text is the concatenation of the first candidate's text parts. Sources
/// keep only grounding entries with both a URI and a title, in original
/// order.
pub fn chunk_from_response(response: &GenerateContentResponse) -> ResponseChunk {
    let candidate = response.candidates.first();

    let text = candidate
        .and_then(|c| c.content.as_ref())
        .map(|content| {
            content
                .parts
                .iter()
                .filter_map(|p| p.text.as_deref())
                .collect::<String>()
        })
        .unwrap_or_default();

    let sources = candidate
        .and_then(|c| c.grounding_metadata.as_ref())
        .map(|metadata| {
            metadata
                .grounding_chunks
                .iter()
                .filter_map(|chunk| chunk.web.as_ref())
                .filter_map(|web| match (&web.uri, &web.title) {
                    (Some(uri), Some(title)) if !uri.is_empty() && !title.is_empty() => {
                        Some(GroundingSource {
                            uri: uri.clone(),
                            title: title.clone(),
                        })
                    }
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();

    ResponseChunk { text, sources }
}
