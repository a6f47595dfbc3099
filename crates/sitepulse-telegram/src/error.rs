//! Error types for the Telegram crate.

use thiserror::Error;

/// Startup configuration errors. Fatal: the process refuses to start
/// partially configured.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is absent.
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    /// An environment variable is present but unparseable.
    #[error("invalid value for {name}: {reason}")]
    Invalid {
        /// Variable name.
        name: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}

/// Errors that can occur in the Telegram interface.
#[derive(Debug, Error)]
pub enum BotError {
    /// Configuration error at startup.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Telegram API call failed.
    #[error("telegram error: {0}")]
    Api(String),

    /// Photo download failed.
    #[error("download failed: {0}")]
    Download(String),

    /// Log store error.
    #[error("store error: {0}")]
    Store(#[from] sitepulse_persistence::PersistenceError),

    /// Runtime error.
    #[error("runtime error: {0}")]
    Runtime(#[from] sitepulse_runtime::RuntimeError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for bot operations.
pub type Result<T> = std::result::Result<T, BotError>;

impl From<teloxide::RequestError> for BotError {
    fn from(e: teloxide::RequestError) -> Self {
        BotError::Api(e.to_string())
    }
}

impl From<teloxide::DownloadError> for BotError {
    fn from(e: teloxide::DownloadError) -> Self {
        BotError::Download(e.to_string())
    }
}
