//! Error types for laneway.
//!
//! All fallible operations across the workspace return [`Result`] with this
//! crate's [`Error`]. HTTP status mapping lives in the API layer.

use thiserror::Error;
use uuid::Uuid;

/// Result type alias using laneway's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for laneway operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Generic resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Board not found by ID
    #[error("Board not found: {0}")]
    BoardNotFound(Uuid),

    /// Queue not found by ID (also raised when a queue exists but belongs
    /// to a different board than the mutation named)
    #[error("Queue not found: {0}")]
    QueueNotFound(Uuid),

    /// Item not found by ID (also raised for deleted items and for items
    /// outside the mutation's board)
    #[error("Item not found: {0}")]
    ItemNotFound(Uuid),

    /// Notification not found by ID for the requesting recipient
    #[error("Notification not found: {0}")]
    NotificationNotFound(Uuid),

    /// Concurrent modification conflict. Reserved for a future optimistic
    /// mode with client version tokens; FIFO serialization makes same-queue
    /// conflicts structurally impossible today, so nothing raises this yet.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether this error is any of the not-found variants.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::NotFound(_)
                | Error::BoardNotFound(_)
                | Error::QueueNotFound(_)
                | Error::ItemNotFound(_)
                | Error::NotificationNotFound(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
