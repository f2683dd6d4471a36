//! Common error types for the clinic services

use thiserror::Error;

/// Common result type for clinic operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across clinic services
#[derive(Error, Debug)]
pub enum Error {
    /// Store failure (connectivity, lock contention, commit failure).
    ///
    /// Any unit of work that fails with this error has been rolled back; callers may retry.
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

    /// Request rejected before touching the store
    #[error("Validation error: {0}")]
    Validation(String),

    /// Request conflicts with current state (e.g. room already occupied)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True when the error came from the store and the operation can be retried
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Database(_))
    }

    /// True for unique-constraint violations reported by SQLite
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Error::Database(sqlx::Error::Database(db_err)) => db_err.is_unique_violation(),
            _ => false,
        }
    }
}
