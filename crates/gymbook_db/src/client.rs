//! Database client for the gym booking backend
//!
//! This module provides a database client that is designed to be database agnostic,
//! using SQLx's `Any` driver underneath.

use crate::error::DbError;
use gymbook_config::{AppConfig, DatabaseConfig};
use sqlx::pool::PoolOptions;
use sqlx::{Pool, Transaction};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// Type alias for a database transaction
pub type DbTransaction<'a> = Transaction<'a, sqlx::Any>;

/// The concrete engine behind the `Any` pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbBackend {
    Sqlite,
    Postgres,
    MySql,
}

impl DbBackend {
    /// Infer the engine from a connection URL.
    pub fn from_url(db_url: &str) -> Result<Self, DbError> {
        if db_url.starts_with("sqlite:") {
            Ok(DbBackend::Sqlite)
        } else if db_url.starts_with("postgres:") || db_url.starts_with("postgresql:") {
            Ok(DbBackend::Postgres)
        } else if db_url.starts_with("mysql:") || db_url.starts_with("mariadb:") {
            Ok(DbBackend::MySql)
        } else {
            Err(DbError::UrlError(format!(
                "Unsupported database URL scheme: {}",
                db_url
            )))
        }
    }

    /// Whether transactions need an explicit `SERIALIZABLE` isolation level
    /// for check-then-insert sequences to be safe.
    pub fn needs_serializable(self) -> bool {
        !matches!(self, DbBackend::Sqlite)
    }
}

/// Database client
///
/// Cheap to clone; clones share the same connection pool.
#[derive(Debug, Clone)]
pub struct DbClient {
    /// The database connection pool
    pool: Pool<sqlx::Any>,
    backend: DbBackend,
}

impl DbClient {
    /// Create a new database client
    ///
    /// # Arguments
    ///
    /// * `config` - The application configuration
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    ///
    /// * The database configuration is missing
    /// * The database URL is missing
    /// * The database connection fails
    pub async fn new(config: &Arc<AppConfig>) -> Result<Self, DbError> {
        let db_config = config
            .database
            .as_ref()
            .ok_or_else(|| DbError::ConfigError("Database configuration is missing".to_string()))?;

        Self::from_config(db_config).await
    }

    /// Create a new database client from a database configuration
    pub async fn from_config(db_config: &DatabaseConfig) -> Result<Self, DbError> {
        let db_url = &db_config.url;
        if db_url.is_empty() {
            return Err(DbError::ConfigError("Database URL is empty".to_string()));
        }

        Self::from_url(db_url).await
    }

    /// Create a new database client from a database URL
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    ///
    /// * The database URL is empty or has an unsupported scheme
    /// * The database connection fails
    pub async fn from_url(db_url: &str) -> Result<Self, DbError> {
        if db_url.is_empty() {
            return Err(DbError::UrlError("Database URL is empty".to_string()));
        }
        let backend = DbBackend::from_url(db_url)?;

        let pool = Self::create_pool(db_url, backend).await?;

        Ok(Self { pool, backend })
    }

    async fn create_pool(db_url: &str, backend: DbBackend) -> Result<Pool<sqlx::Any>, DbError> {
        debug!("Creating {:?} database pool with URL: {}", backend, db_url);

        // Register the compiled-in drivers with the "any" driver
        sqlx::any::install_default_drivers();

        let pool_options = PoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .idle_timeout(Duration::from_secs(600));

        // AnyConnectOptions cannot set create_if_missing, so the SQLite file is
        // created up front.
        if backend == DbBackend::Sqlite {
            Self::ensure_sqlite_file(db_url)?;
        }

        let pool = pool_options
            .connect_with(sqlx::any::AnyConnectOptions::from_str(db_url)?)
            .await
            .map_err(|e| {
                error!("Failed to create database pool: {}", e);
                DbError::PoolError(e.to_string())
            })?;

        info!("Database pool created successfully");
        Ok(pool)
    }

    fn ensure_sqlite_file(db_url: &str) -> Result<(), DbError> {
        // Handle both "sqlite:example.db" and "sqlite://example.db" formats
        let db_path = db_url
            .strip_prefix("sqlite://")
            .or_else(|| db_url.strip_prefix("sqlite:"))
            .unwrap_or(db_url);
        // Drop query parameters such as "?mode=rwc"
        let db_path = db_path.split('?').next().unwrap_or(db_path);

        if db_path.is_empty() || db_path.contains(":memory:") {
            return Ok(());
        }

        let path = Path::new(db_path);
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                debug!("Creating directory for SQLite database: {:?}", dir);
                std::fs::create_dir_all(dir).map_err(|e| {
                    error!("Failed to create directory for SQLite database: {}", e);
                    DbError::PoolError(format!("Failed to create directory: {}", e))
                })?;
            }
        }

        if !path.exists() {
            debug!("Creating empty SQLite database file: {}", db_path);
            std::fs::File::create(path).map_err(|e| {
                error!("Failed to create SQLite database file: {}", e);
                DbError::PoolError(format!("Failed to create database file: {}", e))
            })?;
        }
        Ok(())
    }

    /// Get the database connection pool
    pub fn pool(&self) -> &Pool<sqlx::Any> {
        &self.pool
    }

    /// The engine this client talks to
    pub fn backend(&self) -> DbBackend {
        self.backend
    }

    /// Begin a transaction
    ///
    /// On engines other than SQLite the transaction is raised to `SERIALIZABLE`
    /// before it is handed out.
    pub async fn begin(&self) -> Result<DbTransaction<'_>, DbError> {
        // Kept as `SqlxError` so pool timeouts still classify as contention.
        let mut tx = self.pool.begin().await?;

        if self.backend.needs_serializable() {
            sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
                .execute(&mut *tx)
                .await?;
        }
        Ok(tx)
    }

    /// Execute a statement that returns no rows, yielding the number of rows affected
    pub async fn execute(&self, query: &str) -> Result<u64, DbError> {
        sqlx::query(query)
            .execute(&self.pool)
            .await
            .map(|r| r.rows_affected())
            .map_err(|e| DbError::QueryError(e.to_string()))
    }

    /// Check if the database is healthy by executing a trivial query
    pub async fn is_healthy(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

impl std::fmt::Display for DbClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DbClient({:?})", self.backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_is_inferred_from_scheme() {
        assert_eq!(
            DbBackend::from_url("sqlite:data/gym.db").unwrap(),
            DbBackend::Sqlite
        );
        assert_eq!(
            DbBackend::from_url("postgres://localhost/gym").unwrap(),
            DbBackend::Postgres
        );
        assert_eq!(
            DbBackend::from_url("mysql://localhost/gym").unwrap(),
            DbBackend::MySql
        );
        assert!(DbBackend::from_url("redis://localhost").is_err());
        assert!(!DbBackend::Sqlite.needs_serializable());
        assert!(DbBackend::Postgres.needs_serializable());
    }

    #[tokio::test]
    async fn empty_url_is_rejected() {
        let err = DbClient::from_url("").await.unwrap_err();
        assert!(matches!(err, DbError::UrlError(_)));
    }
}
