#[cfg(test)]
mod tests {
    use crate::logic::{calculate_available_slots, end_of_slot, SLOT_STEP_MINUTES};
    use chrono::{Duration, NaiveTime};
    use gymbook_common::models::TimeRange;
    use proptest::prelude::*;

    fn minute_of_day(minutes: u32) -> NaiveTime {
        NaiveTime::from_num_seconds_from_midnight_opt(minutes * 60, 0).unwrap()
    }

    // Window bounds as minutes since midnight, start < end
    fn window_strategy() -> impl Strategy<Value = TimeRange> {
        (0u32..1380, 15u32..720).prop_map(|(start, length)| {
            let end = (start + length).min(24 * 60 - 1);
            TimeRange::new(minute_of_day(start), minute_of_day(end))
        })
    }

    // Busy intervals anywhere in the day, 15 to 180 minutes long
    fn busy_strategy() -> impl Strategy<Value = Vec<TimeRange>> {
        prop::collection::vec(
            (0u32..1380, 15u32..180).prop_map(|(start, length)| {
                let end = (start + length).min(24 * 60 - 1);
                TimeRange::new(minute_of_day(start), minute_of_day(end))
            }),
            0..8,
        )
    }

    proptest! {
        // Every slot fits inside the window
        #[test]
        fn slots_stay_inside_window(
            window in window_strategy(),
            busy in busy_strategy(),
            duration_minutes in 15i64..=180,
        ) {
            let duration = Duration::minutes(duration_minutes);
            for slot in calculate_available_slots(window, duration, &busy, None) {
                let end = end_of_slot(slot, duration).unwrap();
                prop_assert!(slot >= window.start);
                prop_assert!(end <= window.end);
            }
        }

        // No slot overlaps a busy interval
        #[test]
        fn slots_avoid_busy_set(
            window in window_strategy(),
            busy in busy_strategy(),
            duration_minutes in 15i64..=180,
        ) {
            let duration = Duration::minutes(duration_minutes);
            for slot in calculate_available_slots(window, duration, &busy, None) {
                let range = TimeRange::new(slot, end_of_slot(slot, duration).unwrap());
                prop_assert!(busy.iter().all(|b| !b.overlaps(&range)));
            }
        }

        // Output is strictly ascending, on the step grid, and repeatable
        #[test]
        fn slots_are_ordered_gridded_and_stable(
            window in window_strategy(),
            busy in busy_strategy(),
            duration_minutes in 15i64..=180,
            now_minute in prop::option::of(0u32..1440),
        ) {
            let duration = Duration::minutes(duration_minutes);
            let not_before = now_minute.map(minute_of_day);
            let slots = calculate_available_slots(window, duration, &busy, not_before);

            prop_assert!(slots.windows(2).all(|w| w[0] < w[1]));
            for slot in &slots {
                let offset = (*slot - window.start).num_minutes();
                prop_assert_eq!(offset % SLOT_STEP_MINUTES, 0);
                if let Some(now) = not_before {
                    prop_assert!(*slot >= now);
                }
            }
            prop_assert_eq!(
                slots,
                calculate_available_slots(window, duration, &busy, not_before)
            );
        }

        // Busy intervals only ever remove slots
        #[test]
        fn busy_set_only_removes_slots(
            window in window_strategy(),
            busy in busy_strategy(),
            duration_minutes in 15i64..=180,
        ) {
            let duration = Duration::minutes(duration_minutes);
            let free = calculate_available_slots(window, duration, &[], None);
            let taken = calculate_available_slots(window, duration, &busy, None);
            prop_assert!(taken.iter().all(|slot| free.contains(slot)));
        }
    }
}
