//! Error types for pgscope

use thiserror::Error;

/// Core error type for pgscope operations
#[derive(Error, Debug)]
pub enum PgscopeError {
    /// The connection could not be opened or is no longer usable.
    #[error("Connection error: {0}")]
    Connection(String),

    /// A specific catalog query failed (syntax, permission, connectivity).
    #[error("Query error: {0}")]
    Query(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Not supported: {0}")]
    NotSupported(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl PgscopeError {
    /// Whether the error means the connection itself is gone, as opposed to a
    /// single statement failing.
    pub fn is_connection(&self) -> bool {
        matches!(self, PgscopeError::Connection(_))
    }
}

/// Result type alias for pgscope operations
pub type Result<T> = std::result::Result<T, PgscopeError>;
