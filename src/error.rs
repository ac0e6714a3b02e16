//! Error types for Newsdesk.

use thiserror::Error;

/// Common error type for Newsdesk.
#[derive(Error, Debug)]
pub enum NewsdeskError {
    /// Database error.
    ///
    /// Errors from sqlx are converted into this variant.
    #[error("database error: {0}")]
    Database(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Unique constraint violation (e.g. duplicate newsletter email).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Feed fetch or parse error.
    #[error("feed error: {0}")]
    Feed(String),

    /// OPML document error.
    #[error("OPML error: {0}")]
    Opml(String),

    /// Offline cache error.
    #[error("cache error: {0}")]
    Cache(String),

    /// HTTP client error (page source, listener).
    #[error("HTTP error: {0}")]
    Http(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<sqlx::Error> for NewsdeskError {
    fn from(e: sqlx::Error) -> Self {
        NewsdeskError::Database(e.to_string())
    }
}

/// Result type alias for Newsdesk operations.
pub type Result<T> = std::result::Result<T, NewsdeskError>;
