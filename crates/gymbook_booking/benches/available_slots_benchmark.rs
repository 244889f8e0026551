use chrono::{Duration, NaiveDate, NaiveTime, Weekday};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use gymbook_booking::clock::FixedClock;
use gymbook_booking::logic::calculate_available_slots;
use gymbook_booking::{BookingPolicy, BookingService, MemoryBookingStore};
use gymbook_common::models::{Service, ServiceId, TimeRange, TrainerAvailability, TrainerId};
use gymbook_common::BookingStore;
use std::sync::Arc;

fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

// Helper function to create back-to-back busy intervals with gaps
fn create_busy_intervals(count: u32, length_minutes: i64, gap_minutes: i64) -> Vec<TimeRange> {
    let mut busy = Vec::new();
    let mut start = t(6, 0);
    for _ in 0..count {
        let end = start + Duration::minutes(length_minutes);
        busy.push(TimeRange::new(start, end));
        start = end + Duration::minutes(gap_minutes);
    }
    busy
}

fn benchmark_calculate_available_slots(c: &mut Criterion) {
    let mut group = c.benchmark_group("calculate_available_slots");
    let window = TimeRange::new(t(6, 0), t(22, 0));
    let duration = Duration::minutes(60);

    group.bench_function("no_busy_intervals", |b| {
        let busy = Vec::new();
        b.iter(|| {
            calculate_available_slots(
                black_box(window),
                black_box(duration),
                black_box(&busy),
                black_box(None),
            )
        })
    });

    group.bench_function("few_busy_intervals", |b| {
        let busy = create_busy_intervals(4, 60, 120);
        b.iter(|| {
            calculate_available_slots(
                black_box(window),
                black_box(duration),
                black_box(&busy),
                black_box(None),
            )
        })
    });

    group.bench_function("fully_booked_day", |b| {
        let busy = create_busy_intervals(16, 60, 0);
        b.iter(|| {
            calculate_available_slots(
                black_box(window),
                black_box(duration),
                black_box(&busy),
                black_box(Some(t(12, 0))),
            )
        })
    });

    group.finish();
}

fn benchmark_resolver_with_store(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let day = NaiveDate::from_ymd_opt(2030, 6, 3).unwrap();

    let store = Arc::new(MemoryBookingStore::new());
    runtime.block_on(async {
        store
            .upsert_service(Service {
                id: ServiceId(1),
                name: "Personal training".to_string(),
                duration_minutes: 60,
                price: 4500,
                is_active: true,
            })
            .await
            .unwrap();
        store
            .upsert_availability(TrainerAvailability {
                trainer_id: TrainerId(7),
                day_of_week: Weekday::Mon,
                start_time: t(6, 0),
                end_time: t(22, 0),
                is_active: true,
            })
            .await
            .unwrap();
    });
    let service = BookingService::new(
        store,
        Arc::new(FixedClock::new(day.and_hms_opt(0, 0, 0).unwrap())),
        BookingPolicy::default(),
    );

    c.bench_function("available_slots_memory_store", |b| {
        b.to_async(&runtime).iter(|| async {
            service
                .available_slots(black_box(TrainerId(7)), black_box(day), black_box(ServiceId(1)))
                .await
                .unwrap()
        })
    });
}

criterion_group!(
    benches,
    benchmark_calculate_available_slots,
    benchmark_resolver_with_store
);
criterion_main!(benches);
