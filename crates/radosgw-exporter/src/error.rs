//! Error types for the exporter
//!
//! Nothing here crosses a scrape: collection failures are absorbed into the
//! health gauge. These errors cover startup, rendering and the server.

use radosgw_admin::AdminError;
use thiserror::Error;

/// Result type alias using ExporterError
pub type Result<T> = std::result::Result<T, ExporterError>;

/// Unified error type for exporter operations
#[derive(Debug, Error)]
pub enum ExporterError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Admin client construction
    #[error("Admin API error: {0}")]
    Admin(#[from] AdminError),

    // Metric registration or encoding
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    // Listener / socket errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Graceful shutdown did not finish within {0:?}")]
    ShutdownTimeout(std::time::Duration),

    // Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<std::string::FromUtf8Error> for ExporterError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        ExporterError::Internal(err.to_string())
    }
}
