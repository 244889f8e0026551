// Declare modules within this crate
pub mod error; // Error handling
pub mod http; // HTTP error rendering
pub mod logging; // Logging utilities
pub mod models; // Domain entities
pub mod store; // Persistence port

// Re-export error types and utilities for easier access
pub use error::{Context, GymbookError, HttpStatusCode};

pub use http::error_response;

pub use logging::{init, init_with_config, init_with_level, log_error, log_result};

pub use store::{BookingStore, BoxFuture, ConflictKind, InsertGuard, StoreError};
