//! Settings error types.

use std::path::PathBuf;

use thiserror::Error;

/// Why settings could not be loaded, or why the loaded values cannot be used.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings file exists but could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// Settings file.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// The settings file is not JSON, or a value has the wrong type.
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        /// Settings file.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },
    /// The listener would be reachable from other machines.
    #[error("server.host must be a loopback address, got {0:?}")]
    NonLoopbackHost(String),
    /// Any other out-of-range value.
    #[error("invalid settings value: {0}")]
    InvalidValue(String),
}

/// Result type for settings operations.
pub type Result<T> = std::result::Result<T, SettingsError>;
