//! Error types for report compilation.

use thiserror::Error;

use sitepulse_clients::ClientError;
use sitepulse_models::SiteId;
use sitepulse_persistence::PersistenceError;

/// Errors that can occur during report compilation.
#[derive(Debug, Error)]
pub enum ReportError {
    /// A compilation for this site is already running.
    #[error("a report compilation for site `{0}` is already in flight")]
    CompileInFlight(SiteId),

    /// The log store failed; logs are load-bearing, so this is fatal to
    /// the compilation.
    #[error("log store error: {0}")]
    Store(#[from] PersistenceError),

    /// The project-status fetch failed; also load-bearing.
    #[error("project status unavailable: {0}")]
    Project(#[source] ClientError),

    /// The renderer could not produce the report document.
    #[error("render failed: {0}")]
    Render(String),
}

/// Result type for report operations.
pub type Result<T> = std::result::Result<T, ReportError>;
