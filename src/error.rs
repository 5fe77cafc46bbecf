//! Error types for API key management
//!
//! Every failure of a command is reported as a single [`KeyCliError`] value.
//! HTTP failures keep their own [`ApiError`] classification so the retry hook
//! can tell recoverable authentication failures from terminal ones.

use thiserror::Error;

use crate::client::ApiError;

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, KeyCliError>;

/// Terminal errors surfaced to the CLI shell.
#[derive(Debug, Error)]
pub enum KeyCliError {
    /// Required command argument was not supplied
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// A required setting is neither passed on the command line nor stored
    #[error("Missing configuration: {0}")]
    MissingConfiguration(String),

    /// The local session store could not be read or written
    #[error("Storage error: {0}")]
    Storage(String),

    /// The settings file is malformed or invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// Key generation, export, import or signing failed
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// No access token could be obtained
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The backend rejected the request with a terminal error
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Token refresh kept failing with recoverable errors
    #[error("Request still unauthorized after {attempts} attempts")]
    RetriesExhausted {
        /// Number of submissions made
        attempts: u32,
    },

    /// The backend answered successfully but without usable data
    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl KeyCliError {
    /// Wraps a crypto library error.
    pub(crate) fn crypto(context: &str, err: impl std::fmt::Display) -> Self {
        KeyCliError::Crypto(format!("{}: {}", context, err))
    }

    /// Wraps an I/O or parse error from the session store.
    pub(crate) fn storage(context: &str, err: impl std::fmt::Display) -> Self {
        KeyCliError::Storage(format!("{}: {}", context, err))
    }
}
