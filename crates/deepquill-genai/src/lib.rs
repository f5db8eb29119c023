//! Gemini streaming for DeepQuill: conversational chat with web grounding
//! and single-turn deep-dive document analysis.
//!
//! Responses stream incrementally; each element carries text plus any
//! citation metadata the provider attached. Errors after setup are folded
//! into a terminal apology chunk rather than raised to the caller.

pub mod client;
pub mod flows;
pub mod history;
pub mod stream;
pub mod types;
pub mod wire;

pub use client::{client, GeminiClient, API_KEY_ENV};
pub use flows::{
    chat_response_stream, deep_dive_response_stream, ChunkStream, CHAT_MODEL, DEEP_DIVE_MODEL,
};
pub use types::{AttachedFile, Author, ChatTurn, GroundingSource, ResponseChunk};
