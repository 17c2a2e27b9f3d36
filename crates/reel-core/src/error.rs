//! Error types for Reel core operations.
//!
//! This module defines well-structured error types using `thiserror` for
//! library-level errors, while the CLI uses `anyhow` for convenient error
//! handling at the top level.

use crate::types::ItemId;
use thiserror::Error;

/// Result type alias using ReelError
pub type Result<T> = std::result::Result<T, ReelError>;

/// Core error types for Reel operations.
///
/// Every mutating operation validates its input before touching any state,
/// so an error always leaves the index or filter exactly as it was.
#[derive(Error, Debug)]
pub enum ReelError {
    // === Index Errors ===
    /// An update or removal referenced an item the index does not hold
    #[error("item {id} not found in index")]
    NotFound { id: ItemId },

    // === Tokenizer Errors ===
    /// An n-gram length range was empty or started at zero
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    // === Configuration Errors ===
    /// Configuration file parsing or validation failed
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    // === I/O Errors ===
    /// Generic I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Serialization Errors ===
    /// Catalog or delta script could not be parsed
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl ReelError {
    /// Returns true if this error was caused by the caller's input rather
    /// than by the environment
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            ReelError::NotFound { .. } | ReelError::InvalidArgument { .. }
        )
    }

    /// Create an invalid argument error
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        ReelError::InvalidArgument {
            reason: reason.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(reason: impl Into<String>) -> Self {
        ReelError::Serialization(reason.into())
    }
}

impl From<serde_json::Error> for ReelError {
    fn from(err: serde_json::Error) -> Self {
        ReelError::Serialization(err.to_string())
    }
}
