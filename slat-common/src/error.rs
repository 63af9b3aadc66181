//! Common error types for SLAT

use thiserror::Error;

/// Common result type for SLAT operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across SLAT crates
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// No sentences occupy the requested index window.
    ///
    /// Distinct from [`Error::NotFound`]: the referenced user exists, but
    /// the index range itself is empty.
    #[error("Range empty: {0}")]
    RangeEmpty(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}
