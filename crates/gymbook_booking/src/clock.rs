//! Source of "now" for the booking rules.
//!
//! All booking times are naive local values, so the clock hands out a naive
//! local date-time in the gym's zone.

use chrono::{Local, NaiveDateTime, Utc};
use chrono_tz::Tz;
use std::sync::{Mutex, PoisonError};
use tracing::warn;

pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Wall clock, optionally pinned to an IANA time zone.
#[derive(Debug, Clone, Default)]
pub struct SystemClock {
    time_zone: Option<Tz>,
}

impl SystemClock {
    /// Unknown zone names fall back to the host's local time.
    pub fn new(time_zone: Option<&str>) -> Self {
        let time_zone = time_zone.and_then(|name| match name.parse::<Tz>() {
            Ok(tz) => Some(tz),
            Err(e) => {
                warn!("Unknown time zone {:?} ({}), using local time", name, e);
                None
            }
        });
        Self { time_zone }
    }

    pub fn time_zone(&self) -> Option<Tz> {
        self.time_zone
    }
}

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        match self.time_zone {
            Some(tz) => Utc::now().with_timezone(&tz).naive_local(),
            None => Local::now().naive_local(),
        }
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<NaiveDateTime>,
}

impl FixedClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: NaiveDateTime) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = now;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn unknown_zone_falls_back_to_local() {
        assert_eq!(SystemClock::new(Some("Mars/Olympus")).time_zone(), None);
        assert_eq!(
            SystemClock::new(Some("Europe/Istanbul")).time_zone(),
            Some(chrono_tz::Europe::Istanbul)
        );
    }

    #[test]
    fn fixed_clock_moves_only_when_set() {
        let at = NaiveDate::from_ymd_opt(2030, 6, 3)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        let clock = FixedClock::new(at);
        assert_eq!(clock.now(), at);
        let later = at + chrono::Duration::hours(3);
        clock.set(later);
        assert_eq!(clock.now(), later);
    }
}
