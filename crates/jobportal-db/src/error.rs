//! Database error types.

use thiserror::Error;

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

/// Errors that can occur while talking to the database.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Invalid database URL: {0}")]
    InvalidUrl(String),

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Query failed: {0}")]
    Query(#[from] sea_orm::DbErr),
}

impl DbError {
    pub fn invalid_url(msg: impl Into<String>) -> Self {
        Self::InvalidUrl(msg.into())
    }

    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Check if error is retryable.
    ///
    /// Only connection-level failures are retried; a bad URL or a failing
    /// statement will not get better by waiting.
    pub fn is_retryable(&self) -> bool {
        match self {
            DbError::Connection(_) => true,
            DbError::Query(err) => matches!(
                err,
                sea_orm::DbErr::Conn(_) | sea_orm::DbErr::ConnectionAcquire(_)
            ),
            DbError::InvalidUrl(_) => false,
        }
    }
}
