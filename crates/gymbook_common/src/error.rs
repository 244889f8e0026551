use crate::store::StoreError;
use std::fmt;
use thiserror::Error;

/// The base error type shared across the gym booking crates.
///
/// Crates with their own error enums convert into this one (or implement
/// [`HttpStatusCode`] themselves) at the HTTP boundary.
#[derive(Error, Debug)]
pub enum GymbookError {
    /// Error occurred due to missing or invalid configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Error occurred during validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Error occurred during database operation
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Error occurred due to a conflict (e.g., slot already taken)
    #[error("Conflict: {0}")]
    ConflictError(String),

    /// Error occurred due to a resource not being found
    #[error("Not found: {0}")]
    NotFoundError(String),

    /// Well-formed request that violates a business rule
    #[error("Unprocessable: {0}")]
    UnprocessableError(String),

    /// Error occurred due to an internal error
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// A trait for converting errors to HTTP status codes.
pub trait HttpStatusCode {
    /// Returns the HTTP status code for this error.
    fn status_code(&self) -> u16;

    /// Stable, machine readable error kind used by clients to pick a message.
    fn kind(&self) -> &'static str;
}

impl HttpStatusCode for GymbookError {
    fn status_code(&self) -> u16 {
        match self {
            GymbookError::ConfigError(_) => 500,
            GymbookError::ValidationError(_) => 400,
            GymbookError::DatabaseError(_) => 500,
            GymbookError::ConflictError(_) => 409,
            GymbookError::NotFoundError(_) => 404,
            GymbookError::UnprocessableError(_) => 422,
            GymbookError::InternalError(_) => 500,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            GymbookError::ConfigError(_) => "config",
            GymbookError::ValidationError(_) => "validation",
            GymbookError::DatabaseError(_) => "database",
            GymbookError::ConflictError(_) => "conflict",
            GymbookError::NotFoundError(_) => "not_found",
            GymbookError::UnprocessableError(_) => "unprocessable",
            GymbookError::InternalError(_) => "internal",
        }
    }
}

/// A trait for adding context to errors.
pub trait Context<T, E> {
    /// Adds context to an error.
    fn context<C>(self, context: C) -> Result<T, GymbookError>
    where
        C: fmt::Display + Send + Sync + 'static;

    /// Adds context to an error with a lazy context provider.
    fn with_context<C, F>(self, f: F) -> Result<T, GymbookError>
    where
        C: fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T, E: std::error::Error + Send + Sync + 'static> Context<T, E> for Result<T, E> {
    fn context<C>(self, context: C) -> Result<T, GymbookError>
    where
        C: fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|error| GymbookError::InternalError(format!("{}: {}", context, error)))
    }

    fn with_context<C, F>(self, f: F) -> Result<T, GymbookError>
    where
        C: fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|error| GymbookError::InternalError(format!("{}: {}", f(), error)))
    }
}

impl From<StoreError> for GymbookError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(_) | StoreError::StatusChanged | StoreError::Busy(_) => {
                GymbookError::ConflictError(err.to_string())
            }
            StoreError::NotFound => GymbookError::NotFoundError(err.to_string()),
            StoreError::Backend(msg) => GymbookError::DatabaseError(msg),
        }
    }
}

impl From<serde_json::Error> for GymbookError {
    fn from(err: serde_json::Error) -> Self {
        GymbookError::ValidationError(err.to_string())
    }
}

impl From<std::io::Error> for GymbookError {
    fn from(err: std::io::Error) -> Self {
        GymbookError::InternalError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ConflictKind;

    #[test]
    fn store_errors_map_to_http_codes() {
        let conflict: GymbookError = StoreError::Conflict(ConflictKind::Trainer).into();
        assert_eq!(conflict.status_code(), 409);
        let missing: GymbookError = StoreError::NotFound.into();
        assert_eq!(missing.status_code(), 404);
        assert_eq!(missing.kind(), "not_found");
        let backend: GymbookError = StoreError::Backend("disk full".into()).into();
        assert_eq!(backend.status_code(), 500);
        assert_eq!(backend.to_string(), "Database error: disk full");
    }

    #[test]
    fn context_wraps_foreign_errors() {
        let result: Result<(), std::io::Error> =
            Err(std::io::Error::new(std::io::ErrorKind::Other, "boom"));
        let err = result.context("reading catalog").unwrap_err();
        assert_eq!(err.to_string(), "Internal error: reading catalog: boom");
    }
}
