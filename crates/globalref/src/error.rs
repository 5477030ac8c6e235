//! Error types for the ambient layer (configuration and logging)
//!
//! Reference operations never produce these. A failing host primitive goes
//! through [`HostEnv::fatal_error`](crate::host::HostEnv::fatal_error)
//! instead.

use thiserror::Error;

/// Main error type for globalref configuration and setup.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Unrecognised log level name
    #[error("Invalid log level: {0}")]
    InvalidLogLevel(String),

    /// Unrecognised log format name
    #[error("Invalid log format: {0}")]
    InvalidLogFormat(String),

    /// A global tracing subscriber could not be installed
    #[error("Logging init failed: {0}")]
    LoggingInit(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Result type alias for globalref setup operations
pub type Result<T> = std::result::Result<T, BridgeError>;
