//! Domain entities shared by the booking core and its stores.
//!
//! Entities never hold references to each other; they carry opaque ids that
//! are resolved through [`crate::store::BookingStore`].

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

numeric_id!(
    /// Identifies a trainer.
    TrainerId
);
numeric_id!(
    /// Identifies a bookable service (session type).
    ServiceId
);
numeric_id!(
    /// Identifies an appointment.
    AppointmentId
);

/// Identifies a member. Members come from the identity system, whose ids are strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(pub String);

impl MemberId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A half-open time-of-day interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeRange {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// The single overlap test used for every conflict check.
    ///
    /// Touching intervals (`self.end == other.start`) do not overlap.
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start < other.end && self.end > other.start
    }

    pub fn contains(&self, other: &TimeRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// Lifecycle of an appointment.
///
/// `Pending -> {Approved, Rejected, Cancelled}`, `Approved -> {Completed, Cancelled}`;
/// the remaining states are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AppointmentStatus {
    Pending,
    Approved,
    Cancelled,
    Completed,
    Rejected,
}

/// Status, stable code, human label.
pub static STATUS_LABELS: [(AppointmentStatus, &str, &str); 5] = [
    (AppointmentStatus::Pending, "Pending", "Awaiting approval"),
    (AppointmentStatus::Approved, "Approved", "Approved"),
    (AppointmentStatus::Cancelled, "Cancelled", "Cancelled"),
    (AppointmentStatus::Completed, "Completed", "Completed"),
    (AppointmentStatus::Rejected, "Rejected", "Rejected"),
];

impl AppointmentStatus {
    fn entry(self) -> &'static (AppointmentStatus, &'static str, &'static str) {
        // The table lists every variant in declaration order.
        &STATUS_LABELS[self as usize]
    }

    /// Stable code used in storage and on the wire.
    pub fn code(self) -> &'static str {
        self.entry().1
    }

    /// Human readable label for presentation.
    pub fn label(self) -> &'static str {
        self.entry().2
    }

    /// Whether an appointment in this state occupies its slot.
    pub fn is_live(self) -> bool {
        !matches!(self, AppointmentStatus::Cancelled | AppointmentStatus::Rejected)
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            AppointmentStatus::Completed | AppointmentStatus::Rejected | AppointmentStatus::Cancelled
        )
    }

    pub fn can_transition_to(self, next: AppointmentStatus) -> bool {
        use AppointmentStatus::*;
        matches!(
            (self, next),
            (Pending, Approved)
                | (Pending, Rejected)
                | (Pending, Cancelled)
                | (Approved, Completed)
                | (Approved, Cancelled)
        )
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown appointment status: {}", self.0)
    }
}

impl std::error::Error for UnknownStatus {}

impl FromStr for AppointmentStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        STATUS_LABELS
            .iter()
            .find(|(_, code, _)| code.eq_ignore_ascii_case(s))
            .map(|(status, _, _)| *status)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// A bookable session type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: ServiceId,
    pub name: String,
    pub duration_minutes: u32,
    /// Smallest currency unit.
    pub price: i64,
    pub is_active: bool,
}

/// A trainer's recurring working window for one day of the week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainerAvailability {
    pub trainer_id: TrainerId,
    pub day_of_week: Weekday,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_active: bool,
}

impl TrainerAvailability {
    pub fn window(&self) -> TimeRange {
        TimeRange::new(self.start_time, self.end_time)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: AppointmentId,
    pub member_id: MemberId,
    pub trainer_id: TrainerId,
    pub service_id: ServiceId,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    /// Denormalised at creation: `start_time + service.duration_minutes`.
    pub end_time: NaiveTime,
    pub status: AppointmentStatus,
    pub price: i64,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

impl Appointment {
    pub fn time_range(&self) -> TimeRange {
        TimeRange::new(self.start_time, self.end_time)
    }

    /// Local date and time at which the session starts.
    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.start_time)
    }
}

/// An appointment that has passed validation and waits to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAppointment {
    pub member_id: MemberId,
    pub trainer_id: TrainerId,
    pub service_id: ServiceId,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub price: i64,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
}

impl NewAppointment {
    pub fn time_range(&self) -> TimeRange {
        TimeRange::new(self.start_time, self.end_time)
    }
}

/// Criteria for listing appointments; `None` fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppointmentFilter {
    pub member_id: Option<MemberId>,
    pub trainer_id: Option<TrainerId>,
    pub date: Option<NaiveDate>,
    pub status: Option<AppointmentStatus>,
}

impl AppointmentFilter {
    pub fn matches(&self, appointment: &Appointment) -> bool {
        self.member_id
            .as_ref()
            .map_or(true, |m| *m == appointment.member_id)
            && self.trainer_id.map_or(true, |t| t == appointment.trainer_id)
            && self.date.map_or(true, |d| d == appointment.date)
            && self.status.map_or(true, |s| s == appointment.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn touching_ranges_do_not_overlap() {
        let busy = TimeRange::new(t(9, 0), t(10, 0));
        assert!(!busy.overlaps(&TimeRange::new(t(10, 0), t(11, 0))));
        assert!(!TimeRange::new(t(8, 0), t(9, 0)).overlaps(&busy));
        assert!(busy.overlaps(&TimeRange::new(t(9, 30), t(10, 30))));
        assert!(busy.overlaps(&TimeRange::new(t(8, 0), t(12, 0))));
    }

    #[test]
    fn label_table_covers_every_status() {
        for &(status, code, label) in STATUS_LABELS.iter() {
            assert_eq!(status.code(), code);
            assert_eq!(status.label(), label);
            assert_eq!(code.parse::<AppointmentStatus>().unwrap(), status);
        }
        assert!("archived".parse::<AppointmentStatus>().is_err());
        assert_eq!(
            "pending".parse::<AppointmentStatus>().unwrap(),
            AppointmentStatus::Pending
        );
    }

    #[test]
    fn state_machine_only_allows_documented_edges() {
        use AppointmentStatus::*;
        let all = [Pending, Approved, Cancelled, Completed, Rejected];
        let allowed = [
            (Pending, Approved),
            (Pending, Rejected),
            (Pending, Cancelled),
            (Approved, Completed),
            (Approved, Cancelled),
        ];
        for from in all {
            for to in all {
                assert_eq!(
                    from.can_transition_to(to),
                    allowed.contains(&(from, to)),
                    "{from} -> {to}"
                );
            }
        }
        for terminal in [Completed, Rejected, Cancelled] {
            assert!(terminal.is_terminal());
        }
        assert!(!Cancelled.is_live());
        assert!(!Rejected.is_live());
        assert!(Approved.is_live());
    }
}
