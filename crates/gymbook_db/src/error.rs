//! Error types for the database client

use gymbook_common::StoreError;
use thiserror::Error;

/// Errors that can occur when working with the database client
#[derive(Debug, Error)]
pub enum DbError {
    /// Error from SQLx
    #[error("Database error: {0}")]
    SqlxError(#[from] sqlx::Error),

    /// Error with the database configuration
    #[error("Database configuration error: {0}")]
    ConfigError(String),

    /// Error with database URL parsing
    #[error("Database URL error: {0}")]
    UrlError(String),

    /// Error with database pool creation
    #[error("Database pool error: {0}")]
    PoolError(String),

    /// Error with database query
    #[error("Database query error: {0}")]
    QueryError(String),

    /// Error with database transaction
    #[error("Database transaction error: {0}")]
    TransactionError(String),

    /// A stored value could not be mapped back onto a domain type
    #[error("Corrupt row: {0}")]
    DecodeError(String),
}

/// Whether a driver error signals lock contention or a serialization failure.
///
/// SQLite reports `SQLITE_BUSY` (5) / `SQLITE_LOCKED` (6) and their extended
/// codes. Postgres uses SQLSTATE `40001` and `40P01`; MySQL reports deadlocks as `1213`.
pub fn is_contention(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            if let Some(code) = db_err.code() {
                let code = code.as_ref();
                if matches!(code, "40001" | "40P01" | "1213") {
                    return true;
                }
                if let Ok(numeric) = code.parse::<i32>() {
                    // Extended SQLite codes keep the primary code in the low byte.
                    if numeric < 4096 && matches!(numeric & 0xff, 5 | 6) {
                        return true;
                    }
                }
            }
            let message = db_err.message().to_ascii_lowercase();
            message.contains("database is locked") || message.contains("database is busy")
        }
        sqlx::Error::PoolTimedOut => true,
        _ => false,
    }
}

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::SqlxError(ref e) if is_contention(e) => StoreError::Busy(err.to_string()),
            other => StoreError::Backend(other.to_string()),
        }
    }
}
