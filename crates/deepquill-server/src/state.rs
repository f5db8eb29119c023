//! Shared application state.

use deepquill_core::DeepQuillConfig;
use deepquill_genai::client::resolve_api_key;

/// Shared application state accessible from all route handlers.
pub struct AppState {
    pub config: DeepQuillConfig,
}

impl AppState {
    pub fn new(config: DeepQuillConfig) -> Self {
        Self { config }
    }

    /// Whether a generation API credential is currently resolvable.
    pub fn genai_available(&self) -> bool {
        resolve_api_key(&self.config.data_paths.genai_config_file).is_ok()
    }
}
