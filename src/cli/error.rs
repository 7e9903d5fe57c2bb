//! CLI error types and conversions

use crate::downloader::EngineError;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Engine error
    #[error("{0}")]
    EngineError(#[from] EngineError),

    /// Configuration error
    #[error("configuration error: {0}")]
    ConfigurationError(String),
}
