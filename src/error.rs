//! Error types for Tundra

use std::io;
use thiserror::Error;

/// Result type for Tundra operations
pub type Result<T> = std::result::Result<T, TundraError>;

/// Errors that can occur in Tundra
#[derive(Debug, Error)]
pub enum TundraError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// JSON encoding or decoding failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Debug listener could not be reached or rejected the record
    #[error("Debug submission to port {port} failed: {reason}")]
    DebugSubmission {
        /// Listener port
        port: u16,
        /// What went wrong
        reason: String,
    },

    /// Live request could not be turned into a call
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Request body too large
    #[error("Data too large: {size} bytes exceeds limit of {limit} bytes")]
    DataTooLarge {
        /// Actual size
        size: usize,
        /// Size limit
        limit: usize,
    },

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}
