//! Factory for creating database clients and the stores built on them.

use crate::client::DbClient;
use crate::error::DbError;
use crate::repositories::SqlBookingStore;
use gymbook_config::AppConfig;
use std::sync::Arc;
use tracing::debug;

/// Factory for creating database clients
#[derive(Debug, Clone, Default)]
pub struct DbClientFactory;

impl DbClientFactory {
    pub fn new() -> Self {
        Self
    }

    /// Create a new database client from an application configuration
    ///
    /// # Errors
    ///
    /// Fails when the `[database]` section is missing or the connection fails.
    pub async fn from_app_config(&self, config: &Arc<AppConfig>) -> Result<DbClient, DbError> {
        debug!("Creating database client from application configuration");
        DbClient::new(config).await
    }

    /// Create a new database client from a database URL
    pub async fn from_url(&self, db_url: &str) -> Result<DbClient, DbError> {
        debug!("Creating database client from URL");
        DbClient::from_url(db_url).await
    }

    /// Connect, create the booking schema if needed and return the SQL store.
    pub async fn booking_store(&self, config: &Arc<AppConfig>) -> Result<SqlBookingStore, DbError> {
        let client = self.from_app_config(config).await?;
        let store = SqlBookingStore::new(client);
        store.init_schema().await?;
        Ok(store)
    }
}
