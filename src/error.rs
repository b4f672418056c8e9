//! Error types for typecoach.

use std::time::Duration;

use thiserror::Error;

/// Errors produced by text sources and the generation adapter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SourceError {
    #[error("unknown source type: {0}")]
    UnknownSource(String),

    #[error("unsupported provider: {0} (supported: anthropic, openai, ollama)")]
    UnsupportedProvider(String),

    #[error("TYPECOACH_LLM_API_KEY is not set and no api-key file was found")]
    MissingApiKey,

    #[error("text generation timed out after {0:?}")]
    Timeout(Duration),

    #[error("text generation request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("text generation returned an empty response")]
    EmptyResponse,

    #[error("this source cannot continue a passage")]
    ContinuationUnsupported,

    #[error("generation worker exited without a result")]
    Disconnected,
}

impl SourceError {
    /// Returns true if retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SourceError::Timeout(_)
                | SourceError::Http(_)
                | SourceError::HttpStatus(_)
                | SourceError::EmptyResponse
        )
    }
}

/// Errors reading or writing the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found at specified path: {0}")]
    NotFound(std::path::PathBuf),

    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors reading or writing the session history file.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid history file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Top-level error for the binary.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    History(#[from] HistoryError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("logging setup failed: {0}")]
    Logging(String),
}

pub type Result<T> = std::result::Result<T, Error>;
