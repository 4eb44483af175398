//! Error types for the database layer

use thiserror::Error;

/// Infrastructure-level database errors (connection, migration).
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("database connection error: {0}")]
    Connection(String),

    #[error("database migration error: {0}")]
    Migration(String),
}

/// Errors surfaced by the store repositories.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    /// A read-state mutation attempted by someone other than the recipient.
    #[error("not the notification recipient")]
    NotRecipient,

    #[error("invalid message body: {0}")]
    Validation(String),

    #[error("database error: {0}")]
    Query(#[from] sqlx::Error),
}
