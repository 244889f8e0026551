mod fixtures;

use fixtures::*;
use gymbook_booking::{BookingError, MemoryBookingStore};
use gymbook_common::models::AppointmentStatus;
use gymbook_common::BookingStore;
use gymbook_db::{DbClient, SqlBookingStore};
use std::sync::Arc;

async fn sqlite_store() -> Arc<dyn BookingStore> {
    let path = std::env::temp_dir().join(format!("gymbook-flow-{}.db", uuid::Uuid::new_v4()));
    let client = DbClient::from_url(&format!("sqlite://{}", path.display()))
        .await
        .expect("sqlite pool");
    let store = SqlBookingStore::new(client);
    store.init_schema().await.expect("schema");
    Arc::new(store)
}

async fn memory_store() -> Arc<dyn BookingStore> {
    Arc::new(MemoryBookingStore::new())
}

async fn book_then_resolve(store: Arc<dyn BookingStore>) {
    let service = create_test_service(store, two_days_before()).await;

    let before = service
        .available_slots(TRAINER, booking_day(), PERSONAL_TRAINING)
        .await
        .unwrap();
    assert_eq!(before.len(), 17);
    assert_eq!(
        before,
        service
            .available_slots(TRAINER, booking_day(), PERSONAL_TRAINING)
            .await
            .unwrap()
    );

    let booked = service
        .try_book(create_booking_request("m-1", PERSONAL_TRAINING, t(10, 0)))
        .await
        .unwrap();
    assert_eq!(booked.status, AppointmentStatus::Pending);

    let after = service
        .available_slots(TRAINER, booking_day(), PERSONAL_TRAINING)
        .await
        .unwrap();
    assert!(after.iter().all(|slot| {
        let end = *slot + chrono::Duration::minutes(60);
        !(*slot < booked.end_time && end > booked.start_time)
    }));
    assert!(after.contains(&t(9, 0)));
    assert!(after.contains(&t(11, 0)));

    // A 45 minute session still fits before the booking.
    let short = service
        .available_slots(TRAINER, booking_day(), ASSESSMENT)
        .await
        .unwrap();
    assert!(short.contains(&t(9, 0)));
    assert!(!short.contains(&t(9, 30)));

    service.cancel_by_member(booked.id, &booked.member_id).await.unwrap();
    let reopened = service
        .available_slots(TRAINER, booking_day(), PERSONAL_TRAINING)
        .await
        .unwrap();
    assert_eq!(reopened, before);
}

async fn racing_bookings(store: Arc<dyn BookingStore>, racers: usize) {
    let service = create_test_service(store, two_days_before()).await;

    let mut handles = Vec::new();
    for i in 0..racers {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            // Alternate between two overlapping starts.
            let start = if i % 2 == 0 { t(10, 0) } else { t(10, 30) };
            service
                .try_book(create_booking_request(
                    &format!("member-{i}"),
                    PERSONAL_TRAINING,
                    start,
                ))
                .await
        }));
    }

    let mut successes = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(BookingError::SlotConflict) => conflicts += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(successes, 1);
    assert_eq!(conflicts, racers - 1);
}

#[tokio::test]
async fn booking_closes_the_slot_in_memory() {
    book_then_resolve(memory_store().await).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn booking_closes_the_slot_in_sqlite() {
    book_then_resolve(sqlite_store().await).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_bookings_admit_exactly_one_in_memory() {
    racing_bookings(memory_store().await, 16).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_bookings_admit_exactly_one_in_sqlite() {
    racing_bookings(sqlite_store().await, 8).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn member_and_admin_transitions_in_sqlite() {
    let service = create_test_service(sqlite_store().await, two_days_before()).await;

    let first = service
        .try_book(create_booking_request("m-1", PERSONAL_TRAINING, t(10, 0)))
        .await
        .unwrap();
    assert_eq!(service.appointment(first.id).await.unwrap(), first);

    let approved = service.approve(first.id).await.unwrap();
    assert_eq!(approved.status, AppointmentStatus::Approved);
    assert!(approved.updated_at.is_some());

    let listed = service.appointments(Default::default()).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].status, AppointmentStatus::Approved);

    let second = service
        .try_book(create_booking_request("m-2", PERSONAL_TRAINING, t(14, 0)))
        .await
        .unwrap();
    let cancelled = service
        .cancel_by_member(second.id, &second.member_id)
        .await
        .unwrap();
    assert_eq!(cancelled.status, AppointmentStatus::Cancelled);

    let completed = service.complete(first.id).await.unwrap();
    assert_eq!(completed.status, AppointmentStatus::Completed);
}

#[tokio::test]
async fn outside_window_is_rejected() {
    let service = create_test_service(memory_store().await, two_days_before()).await;
    assert_eq!(
        service
            .try_book(create_booking_request("m-1", PERSONAL_TRAINING, t(17, 30)))
            .await
            .unwrap_err(),
        BookingError::TrainerUnavailable
    );
}
