//! DeepQuill Core — shared error types and configuration.

pub mod config;
pub mod error;

pub use config::{DataPaths, DeepQuillConfig};
pub use error::{Error, Result};
