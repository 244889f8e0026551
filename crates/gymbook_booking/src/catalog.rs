//! Loads the configured services and trainer windows into a store.

use crate::logic::{parse_time, BookingError, MAX_SERVICE_MINUTES, MIN_SERVICE_MINUTES};
use chrono::Weekday;
use gymbook_common::models::{Service, ServiceId, TrainerAvailability, TrainerId};
use gymbook_common::BookingStore;
use gymbook_config::{AvailabilitySeed, CatalogConfig, ServiceSeed};
use tracing::{debug, info};

pub fn service_from_seed(seed: &ServiceSeed) -> Result<Service, BookingError> {
    if !(MIN_SERVICE_MINUTES..=MAX_SERVICE_MINUTES).contains(&seed.duration_minutes) {
        return Err(BookingError::InvalidRequest(format!(
            "Service {} duration must be between {} and {} minutes, got {}",
            seed.id, MIN_SERVICE_MINUTES, MAX_SERVICE_MINUTES, seed.duration_minutes
        )));
    }
    if seed.price < 0 {
        return Err(BookingError::InvalidRequest(format!(
            "Service {} has a negative price",
            seed.id
        )));
    }
    Ok(Service {
        id: ServiceId(seed.id),
        name: seed.name.clone(),
        duration_minutes: seed.duration_minutes,
        price: seed.price,
        is_active: seed.is_active,
    })
}

pub fn window_from_seed(seed: &AvailabilitySeed) -> Result<TrainerAvailability, BookingError> {
    let day_of_week = seed.day_of_week.parse::<Weekday>().map_err(|_| {
        BookingError::InvalidRequest(format!("Unknown day of week {:?}", seed.day_of_week))
    })?;
    let start_time = parse_time(&seed.start_time)?;
    let end_time = parse_time(&seed.end_time)?;
    if start_time >= end_time {
        return Err(BookingError::InvalidRequest(format!(
            "Trainer {} window on {} must start before it ends",
            seed.trainer_id, seed.day_of_week
        )));
    }
    Ok(TrainerAvailability {
        trainer_id: TrainerId(seed.trainer_id),
        day_of_week,
        start_time,
        end_time,
        is_active: seed.is_active,
    })
}

/// Validate every entry first, then upsert them all.
pub async fn apply_catalog(
    store: &dyn BookingStore,
    catalog: &CatalogConfig,
) -> Result<(), BookingError> {
    let services = catalog
        .services
        .iter()
        .map(service_from_seed)
        .collect::<Result<Vec<_>, _>>()?;
    let windows = catalog
        .availability
        .iter()
        .map(window_from_seed)
        .collect::<Result<Vec<_>, _>>()?;

    for service in services.iter().cloned() {
        debug!("Upserting service {} ({})", service.id, service.name);
        store.upsert_service(service).await?;
    }
    for window in windows.iter().cloned() {
        debug!(
            "Upserting window for trainer {} on {}",
            window.trainer_id, window.day_of_week
        );
        store.upsert_availability(window).await?;
    }

    info!(
        "Catalog applied: {} services, {} availability windows",
        services.len(),
        windows.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryBookingStore;
    use chrono::NaiveTime;

    fn service_seed(duration_minutes: u32) -> ServiceSeed {
        ServiceSeed {
            id: 1,
            name: "Personal training".to_string(),
            duration_minutes,
            price: 4500,
            is_active: true,
        }
    }

    fn window_seed(day: &str, start: &str, end: &str) -> AvailabilitySeed {
        AvailabilitySeed {
            trainer_id: 7,
            day_of_week: day.to_string(),
            start_time: start.to_string(),
            end_time: end.to_string(),
            is_active: true,
        }
    }

    #[test]
    fn service_duration_must_be_in_range() {
        assert!(service_from_seed(&service_seed(15)).is_ok());
        assert!(service_from_seed(&service_seed(180)).is_ok());
        assert!(matches!(
            service_from_seed(&service_seed(10)),
            Err(BookingError::InvalidRequest(_))
        ));
        assert!(service_from_seed(&service_seed(181)).is_err());
    }

    #[test]
    fn windows_parse_day_names_and_reject_inverted_ranges() {
        let window = window_from_seed(&window_seed("Wed", "09:00", "18:00")).unwrap();
        assert_eq!(window.day_of_week, Weekday::Wed);
        assert_eq!(window.start_time, NaiveTime::from_hms_opt(9, 0, 0).unwrap());

        assert!(window_from_seed(&window_seed("Someday", "09:00", "18:00")).is_err());
        assert!(window_from_seed(&window_seed("Mon", "18:00", "09:00")).is_err());
        assert!(window_from_seed(&window_seed("Mon", "09:00", "09:00")).is_err());
        assert!(window_from_seed(&window_seed("Mon", "9am", "18:00")).is_err());
    }

    #[tokio::test]
    async fn invalid_entry_aborts_before_anything_is_written() {
        let store = MemoryBookingStore::new();
        let catalog = CatalogConfig {
            services: vec![service_seed(60)],
            availability: vec![window_seed("Mon", "18:00", "09:00")],
        };
        assert!(apply_catalog(&store, &catalog).await.is_err());
        assert!(store.service(ServiceId(1)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn catalog_is_upserted() {
        let store = MemoryBookingStore::new();
        let catalog = CatalogConfig {
            services: vec![service_seed(60)],
            availability: vec![
                window_seed("Mon", "09:00", "18:00"),
                window_seed("Mon", "10:00", "12:00"),
            ],
        };
        apply_catalog(&store, &catalog).await.unwrap();

        assert_eq!(
            store.service(ServiceId(1)).await.unwrap().unwrap().price,
            4500
        );
        // The later window for the same day replaces the earlier one.
        let window = store
            .active_window(TrainerId(7), Weekday::Mon)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(window.start_time, NaiveTime::from_hms_opt(10, 0, 0).unwrap());
    }
}
