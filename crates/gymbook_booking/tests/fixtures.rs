//! Test fixtures for booking flow tests
//!
//! Factory functions for a seeded catalog and a booking service pinned to a
//! fixed clock.

#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use gymbook_booking::catalog::apply_catalog;
use gymbook_booking::clock::FixedClock;
use gymbook_booking::{BookingPolicy, BookingRequest, BookingService};
use gymbook_common::models::{MemberId, ServiceId, TrainerId};
use gymbook_common::BookingStore;
use gymbook_config::{AvailabilitySeed, CatalogConfig, ServiceSeed};
use std::sync::Arc;

pub const TRAINER: TrainerId = TrainerId(7);
pub const PERSONAL_TRAINING: ServiceId = ServiceId(1);
pub const ASSESSMENT: ServiceId = ServiceId(2);

pub fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

/// A Monday well in the future
pub fn booking_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2030, 6, 3).unwrap()
}

/// Two days before `booking_day`, early morning
pub fn two_days_before() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2030, 6, 1)
        .unwrap()
        .and_hms_opt(7, 0, 0)
        .unwrap()
}

/// A 60 minute and a 45 minute service, trainer 7 working Mon 09:00-18:00
pub fn create_test_catalog() -> CatalogConfig {
    CatalogConfig {
        services: vec![
            ServiceSeed {
                id: PERSONAL_TRAINING.0,
                name: "Personal training".to_string(),
                duration_minutes: 60,
                price: 4500,
                is_active: true,
            },
            ServiceSeed {
                id: ASSESSMENT.0,
                name: "Body composition assessment".to_string(),
                duration_minutes: 45,
                price: 2500,
                is_active: true,
            },
        ],
        availability: vec![AvailabilitySeed {
            trainer_id: TRAINER.0,
            day_of_week: "Mon".to_string(),
            start_time: "09:00".to_string(),
            end_time: "18:00".to_string(),
            is_active: true,
        }],
    }
}

/// Seeds `store` with the test catalog and wraps it in a service at `now`
pub async fn create_test_service(
    store: Arc<dyn BookingStore>,
    now: NaiveDateTime,
) -> BookingService {
    apply_catalog(store.as_ref(), &create_test_catalog())
        .await
        .expect("catalog applies");
    BookingService::new(
        store,
        Arc::new(FixedClock::new(now)),
        BookingPolicy::default(),
    )
}

pub fn create_booking_request(member: &str, service: ServiceId, start: NaiveTime) -> BookingRequest {
    BookingRequest {
        member_id: MemberId::new(member),
        trainer_id: TRAINER,
        service_id: service,
        date: booking_day(),
        start_time: start,
        notes: None,
    }
}
