//! Repository modules for database access
//!
//! This module contains the SQL implementations of the persistence ports
//! defined in `gymbook-common`.

pub mod booking_store_sql;
mod rows;

pub use booking_store_sql::SqlBookingStore;
