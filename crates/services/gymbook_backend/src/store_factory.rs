//! Chooses the persistence backend for the booking core.

use gymbook_booking::MemoryBookingStore;
use gymbook_common::{log_error, BookingStore, GymbookError};
use gymbook_config::AppConfig;
use gymbook_db::DbClientFactory;
use std::sync::Arc;
use tracing::{info, warn};

/// The SQL store when `use_database` is set and a database is configured,
/// otherwise an in-process store that lives as long as the server.
pub async fn create_booking_store(
    config: &Arc<AppConfig>,
) -> Result<Arc<dyn BookingStore>, GymbookError> {
    match (config.use_database, config.database.as_ref()) {
        (true, Some(_)) => {
            let store = DbClientFactory::new()
                .booking_store(config)
                .await
                .map_err(|e| {
                    log_error(&e, "Opening the booking database");
                    GymbookError::DatabaseError(e.to_string())
                })?;
            info!("Using SQL booking store ({})", store.client());
            Ok(Arc::new(store))
        }
        (true, None) => {
            warn!("use_database is set but [database] is missing; falling back to memory");
            Ok(Arc::new(MemoryBookingStore::new()))
        }
        (false, _) => {
            info!("Using in-memory booking store");
            Ok(Arc::new(MemoryBookingStore::new()))
        }
    }
}
