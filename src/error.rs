//! Error types for filerelay
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using RelayError
pub type Result<T> = std::result::Result<T, RelayError>;

/// Unified error type for filerelay operations
#[derive(Debug, Error)]
pub enum RelayError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error("Protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid file name: {0}")]
    InvalidFileName(String),

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Network error: {0}")]
    Network(String),

    #[error("Signal handler error: {0}")]
    Signal(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl RelayError {
    /// True if the peer closed the stream before a full value arrived
    pub fn is_eof(&self) -> bool {
        matches!(self, RelayError::Io(e) if e.kind() == std::io::ErrorKind::UnexpectedEof)
    }
}
