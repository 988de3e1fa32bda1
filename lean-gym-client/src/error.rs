//! Error types for lean-gym-client.

use thiserror::Error;

/// Result type alias using lean-gym-client's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to a lean-gym REPL.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration or environment error (e.g. `screen` is not installed)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Operation attempted on a closed connection
    #[error("Invalid state: cannot {operation}, connection is closed")]
    InvalidState { operation: &'static str },

    /// Timeout while waiting for responses
    #[error("Operation timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// Multiplexer invocation failed
    #[error("Subprocess communication error: {0}")]
    SubprocessComm(String),

    /// Log file or temp file I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create an invalid state error for the named operation.
    pub fn invalid_state(operation: &'static str) -> Self {
        Self::InvalidState { operation }
    }

    /// Create a timeout error.
    pub fn timeout(duration_ms: u64) -> Self {
        Self::Timeout { duration_ms }
    }

    /// Whether this error was raised because the connection is closed.
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, Self::InvalidState { .. })
    }
}
