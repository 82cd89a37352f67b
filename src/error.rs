//! Error types for Corkboard.

use thiserror::Error;

/// Common error type for Corkboard.
#[derive(Error, Debug)]
pub enum BoardError {
    /// Database error.
    ///
    /// Wraps errors from the underlying database backend. This is the only
    /// error class that is allowed to propagate as a fatal request failure.
    #[error("database error: {0}")]
    Database(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Authentication error.
    #[error("authentication error: {0}")]
    Auth(String),

    /// Permission denied error.
    #[error("permission denied: {0}")]
    Permission(String),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<sqlx::Error> for BoardError {
    fn from(e: sqlx::Error) -> Self {
        BoardError::Database(e.to_string())
    }
}

/// Result type alias for Corkboard operations.
pub type Result<T> = std::result::Result<T, BoardError>;
