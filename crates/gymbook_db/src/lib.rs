//! Database integration for the gym booking backend
//!
//! This crate provides a database client that is designed to be database agnostic,
//! using SQLx's `Any` driver. SQLite is compiled in by default; PostgreSQL and
//! MySQL are available through feature flags.
//!
//! On top of the client sits [`SqlBookingStore`], the SQL implementation of the
//! `BookingStore` port from `gymbook-common`.
//!
//! # Example
//!
//! ```rust,no_run
//! use gymbook_config::AppConfig;
//! use gymbook_db::DbClientFactory;
//! use std::sync::Arc;
//!
//! async fn setup_store() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Arc::new(AppConfig::default());
//!     let store = DbClientFactory::new().booking_store(&config).await?;
//!     println!("connected: {}", store.client());
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod factory;
pub mod repositories;

pub use client::{DbBackend, DbClient, DbTransaction};
pub use error::DbError;
pub use factory::DbClientFactory;
pub use repositories::SqlBookingStore;
