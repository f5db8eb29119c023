//! Conversation and response types matching the front-end API surface.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::path::Path;

use deepquill_core::Result;

use crate::wire::Part;

/// Author of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Author {
    User,
    Ai,
}

/// One message in a conversation, in chronological order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub author: Author,
    pub text: String,
}

/// A citation (URI + title) supporting part of a generated response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingSource {
    pub uri: String,
    pub title: String,
}

/// One streamed response increment handed back to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseChunk {
    pub text: String,
    pub sources: Vec<GroundingSource>,
}

/// An in-memory file attachment for multimodal requests.
#[derive(Debug, Clone)]
pub struct AttachedFile {
    pub name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl AttachedFile {
    /// Create an attachment from bytes already in memory.
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            data,
        }
    }

    /// Read a file from disk, inferring the MIME type from its extension.
    ///
    /// The whole file is read into memory; no size limit is enforced here.
    pub async fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("attachment")
            .to_string();
        let mime_type = mime_from_extension(
            path.extension().and_then(|e| e.to_str()).unwrap_or(""),
        );
        let data = tokio::fs::read(path).await?;
        Ok(Self {
            name,
            mime_type: mime_type.to_string(),
            data,
        })
    }

    /// Encode the file as an inline-data request part.
    pub fn to_inline_part(&self) -> Part {
        Part::inline_data(&self.mime_type, BASE64.encode(&self.data))
    }
}

/// Map a file extension to a MIME type for inline upload.
pub fn mime_from_extension(ext: &str) -> &'static str {
    match ext.to_lowercase().as_str() {
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "md" | "mdx" => "text/markdown",
        "html" | "htm" => "text/html",
        "csv" => "text/csv",
        "json" => "application/json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        _ => "application/octet-stream",
    }
}
