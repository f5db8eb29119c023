//! Lazy process-wide Gemini client handle and credential resolution.

use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;
use serde::Deserialize;
use tracing::debug;

use deepquill_core::{Error, Result};

use crate::stream::{sse_event_stream, RawEventStream};
use crate::wire::GenerateContentRequest;

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Generation API base URL.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

static CLIENT: OnceCell<GeminiClient> = OnceCell::new();

/// Handle to the Gemini generation API.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    /// Create a client with an explicit key (no global memoization).
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Override the base URL (tests point this at a local server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Open a streamed generation request against the named model.
    ///
    /// The returned stream is lazy and forward-only; nothing is sent until
    /// it is first polled.
    pub fn stream_generate(&self, model: &str, request: GenerateContentRequest) -> RawEventStream {
        let url = format!("{}/models/{}:streamGenerateContent?alt=sse", self.base_url, model);
        debug!(model, contents = request.contents.len(), "opening generation stream");
        sse_event_stream(self.http.clone(), url, self.api_key.clone(), request)
    }
}

/// Get the process-wide client, initializing it on first use.
///
/// A failed resolution is not cached: the configuration error propagates on
/// every call until a credential becomes available. Once constructed, the
/// instance lives for the process lifetime with no re-resolution.
pub fn client() -> Result<&'static GeminiClient> {
    CLIENT.get_or_try_init(|| {
        let api_key = resolve_api_key(&default_config_path())?;
        Ok(GeminiClient::new(api_key))
    })
}

/// Persisted credential file shape (`genai-config.json`).
#[derive(Debug, Deserialize)]
struct PersistedConfig {
    #[serde(rename = "apiKey")]
    api_key: Option<String>,
}

/// Resolve the API key: environment first, then the persisted config file.
///
/// Local file read only; no network interaction happens here.
pub fn resolve_api_key(config_file: &Path) -> Result<String> {
    if let Ok(key) = std::env::var(API_KEY_ENV) {
        if !key.is_empty() {
            return Ok(key);
        }
    }

    let persisted = std::fs::read_to_string(config_file)
        .ok()
        .and_then(|s| serde_json::from_str::<PersistedConfig>(&s).ok())
        .and_then(|c| c.api_key);
    if let Some(key) = persisted {
        if !key.is_empty() {
            return Ok(key);
        }
    }

    Err(Error::Config(format!(
        "no API key: set {} or add \"apiKey\" to {}",
        API_KEY_ENV,
        config_file.display()
    )))
}

fn default_config_path() -> PathBuf {
    std::env::var("DEEPQUILL_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data"))
        .join("genai-config.json")
}
