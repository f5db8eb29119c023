//! The two public streaming flows: conversational chat and deep-dive analysis.

use std::pin::Pin;

use futures::Stream;
use tokio_stream::StreamExt;
use tracing::error;

use deepquill_core::Result;

use crate::client::client;
use crate::history::adapt_history;
use crate::stream::{chunk_from_response, RawEventStream};
use crate::types::{AttachedFile, ChatTurn, ResponseChunk};
use crate::wire::{
    Content, GenerateContentRequest, GenerationConfig, GoogleSearch, Part, ThinkingConfig, Tool,
};

/// Short-form model used for conversational chat.
pub const CHAT_MODEL: &str = "gemini-2.5-flash";

/// Larger-context model used for deep-dive analysis.
pub const DEEP_DIVE_MODEL: &str = "gemini-2.5-pro";

/// Fixed deliberation budget for deep-dive requests.
pub const DEEP_DIVE_THINKING_BUDGET: i32 = 32_768;

const CHAT_SYSTEM_INSTRUCTION: &str = "You are DeepQuill, a helpful research assistant. \
     Answer clearly and concisely. Use web search when it helps, and ground \
     your answers in the sources you find.";

const DEEP_DIVE_SYSTEM_INSTRUCTION: &str = "You are DeepQuill's deep-dive analyst. Read the \
     provided material carefully and produce a thorough, well-structured \
     analysis with key findings first.";

/// Text part sent when a deep-dive message is empty.
pub const DEFAULT_ANALYSIS_PROMPT: &str = "Please analyze this document.";

const CHAT_APOLOGY: &str =
    "Sorry, I ran into a problem while answering. Please try again.";

const DEEP_DIVE_APOLOGY: &str =
    "Sorry, I ran into a problem while analyzing this material. Please try again.";

/// Boxed stream of caller-facing chunks.
pub type ChunkStream = Pin<Box<dyn Stream<Item = ResponseChunk> + Send>>;

/// Stream a conversational response.
///
/// History is adapted to the provider's role format, the new message is
/// appended as a user turn, and the flash model answers with web search
/// enabled. Returns `Err` only for a missing credential; provider and
/// network failures surface as a single in-stream apology chunk.
pub fn chat_response_stream(history: Vec<ChatTurn>, new_message: String) -> Result<ChunkStream> {
    let client = client()?;
    let request = build_chat_request(&history, &new_message);
    let raw = client.stream_generate(CHAT_MODEL, request);
    Ok(with_placeholder(raw, CHAT_APOLOGY, true))
}

/// Stream a single-turn deep-dive analysis of a message and optional file.
///
/// No history is carried and no tools are enabled; citations are never
/// attached in this flow. Same error policy as [`chat_response_stream`].
pub fn deep_dive_response_stream(
    new_message: String,
    file: Option<AttachedFile>,
) -> Result<ChunkStream> {
    let client = client()?;
    let request = build_deep_dive_request(&new_message, file.as_ref());
    let raw = client.stream_generate(DEEP_DIVE_MODEL, request);
    Ok(with_placeholder(raw, DEEP_DIVE_APOLOGY, false))
}

fn build_chat_request(history: &[ChatTurn], new_message: &str) -> GenerateContentRequest {
    let mut contents = adapt_history(history);
    contents.push(Content {
        role: Some("user".into()),
        parts: vec![Part::text(new_message)],
    });

    GenerateContentRequest {
        contents,
        system_instruction: Some(Content::system(CHAT_SYSTEM_INSTRUCTION)),
        tools: Some(vec![Tool {
            google_search: GoogleSearch {},
        }]),
        generation_config: None,
    }
}

fn build_deep_dive_request(
    new_message: &str,
    file: Option<&AttachedFile>,
) -> GenerateContentRequest {
    let mut parts = Vec::new();
    if let Some(file) = file {
        parts.push(file.to_inline_part());
    }
    // The text part is always present; an empty message gets the fixed prompt.
    let text = if new_message.is_empty() {
        DEFAULT_ANALYSIS_PROMPT
    } else {
        new_message
    };
    parts.push(Part::text(text));

    GenerateContentRequest {
        contents: vec![Content {
            role: Some("user".into()),
            parts,
        }],
        system_instruction: Some(Content::system(DEEP_DIVE_SYSTEM_INSTRUCTION)),
        tools: None,
        generation_config: Some(GenerationConfig {
            thinking_config: Some(ThinkingConfig {
                thinking_budget: DEEP_DIVE_THINKING_BUDGET,
            }),
        }),
    }
}

/// Convert raw provider events into caller chunks, substituting a single
/// terminal apology chunk on the first error. Chunks yielded before the
/// failure stay delivered.
fn with_placeholder(
    raw: RawEventStream,
    apology: &'static str,
    with_sources: bool,
) -> ChunkStream {
    Box::pin(async_stream::stream! {
        let mut raw = raw;
        while let Some(item) = raw.next().await {
            match item {
                Ok(response) => {
                    let mut chunk = chunk_from_response(&response);
                    if !with_sources {
                        chunk.sources.clear();
                    }
                    yield chunk;
                }
                Err(e) => {
                    error!("generation stream failed: {}", e);
                    yield ResponseChunk {
                        text: apology.to_string(),
                        sources: Vec::new(),
                    };
                    return;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Author;
    use crate::wire::GenerateContentResponse;
    use deepquill_core::Error;

    fn turn(author: Author, text: &str) -> ChatTurn {
        ChatTurn {
            author,
            text: text.into(),
        }
    }

    fn text_response(text: &str) -> GenerateContentResponse {
        serde_json::from_str(&format!(
            r#"{{"candidates":[{{"content":{{"role":"model","parts":[{{"text":"{text}"}}]}}}}]}}"#
        ))
        .unwrap()
    }

    // ── Chat request building ───────────────────────────────────────────

    #[test]
    fn test_chat_request_has_search_tool_and_history() {
        let history = vec![turn(Author::Ai, "Welcome!"), turn(Author::User, "Hi")];
        let req = build_chat_request(&history, "What's new?");

        // Leading AI turn dropped, user turn + new message remain
        assert_eq!(req.contents.len(), 2);
        assert_eq!(req.contents[0].role.as_deref(), Some("user"));
        assert_eq!(req.contents[1].parts[0].text.as_deref(), Some("What's new?"));
        assert!(req.tools.is_some());
        assert!(req.generation_config.is_none());
        assert!(req.system_instruction.is_some());
    }

    // ── Deep-dive request building ──────────────────────────────────────

    #[test]
    fn test_deep_dive_request_single_turn_no_tools() {
        let req = build_deep_dive_request("Summarize this", None);
        assert_eq!(req.contents.len(), 1);
        assert!(req.tools.is_none());
        let budget = req
            .generation_config
            .unwrap()
            .thinking_config
            .unwrap()
            .thinking_budget;
        assert_eq!(budget, DEEP_DIVE_THINKING_BUDGET);
    }

    #[test]
    fn test_deep_dive_file_part_precedes_text() {
        let file = AttachedFile::new("r.pdf", "application/pdf", b"%PDF".to_vec());
        let req = build_deep_dive_request("Check section 2", Some(&file));
        let parts = &req.contents[0].parts;
        assert_eq!(parts.len(), 2);
        assert!(parts[0].inline_data.is_some());
        assert_eq!(parts[1].text.as_deref(), Some("Check section 2"));
    }

    #[test]
    fn test_deep_dive_empty_message_gets_default_prompt() {
        let file = AttachedFile::new("r.pdf", "application/pdf", b"%PDF".to_vec());
        let req = build_deep_dive_request("", Some(&file));
        let parts = &req.contents[0].parts;
        assert_eq!(parts[1].text.as_deref(), Some(DEFAULT_ANALYSIS_PROMPT));
    }

    #[test]
    fn test_deep_dive_default_prompt_without_file() {
        let req = build_deep_dive_request("", None);
        let parts = &req.contents[0].parts;
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].text.as_deref(), Some(DEFAULT_ANALYSIS_PROMPT));
    }

    // ── Placeholder substitution ────────────────────────────────────────

    #[tokio::test]
    async fn test_immediate_error_yields_exactly_one_placeholder() {
        let raw: RawEventStream =
            Box::pin(futures::stream::iter(vec![Err(Error::Http("down".into()))]));
        let stream = with_placeholder(raw, CHAT_APOLOGY, true);

        let chunks: Vec<ResponseChunk> = stream.collect().await;
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, CHAT_APOLOGY);
        assert!(chunks[0].sources.is_empty());
    }

    #[tokio::test]
    async fn test_partial_output_kept_before_placeholder() {
        let raw: RawEventStream = Box::pin(futures::stream::iter(vec![
            Ok(text_response("first ")),
            Ok(text_response("second")),
            Err(Error::Stream("cut off".into())),
        ]));
        let stream = with_placeholder(raw, DEEP_DIVE_APOLOGY, false);

        let chunks: Vec<ResponseChunk> = stream.collect().await;
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].text, "first ");
        assert_eq!(chunks[1].text, "second");
        assert_eq!(chunks[2].text, DEEP_DIVE_APOLOGY);
    }

    #[tokio::test]
    async fn test_clean_stream_has_no_placeholder() {
        let raw: RawEventStream =
            Box::pin(futures::stream::iter(vec![Ok(text_response("done"))]));
        let stream = with_placeholder(raw, CHAT_APOLOGY, true);

        let chunks: Vec<ResponseChunk> = stream.collect().await;
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "done");
    }

    #[tokio::test]
    async fn test_deep_dive_sources_always_cleared() {
        let resp: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{
                "content":{"role":"model","parts":[{"text":"cited"}]},
                "groundingMetadata":{"groundingChunks":[
                    {"web":{"uri":"https://a.example","title":"A"}}
                ]}
            }]}"#,
        )
        .unwrap();
        let raw: RawEventStream = Box::pin(futures::stream::iter(vec![Ok(resp)]));
        let stream = with_placeholder(raw, DEEP_DIVE_APOLOGY, false);

        let chunks: Vec<ResponseChunk> = stream.collect().await;
        assert!(chunks[0].sources.is_empty());
    }
}
