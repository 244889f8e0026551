//! Persistence port for the booking core.
//!
//! The resolver and the guard only ever talk to storage through
//! [`BookingStore`], which is handed to them explicitly. Implementations live
//! in `gymbook-db` (SQL) and `gymbook-booking` (in-memory).

use crate::models::{
    Appointment, AppointmentFilter, AppointmentId, AppointmentStatus, MemberId, NewAppointment,
    Service, ServiceId, TimeRange, TrainerAvailability, TrainerId,
};
use chrono::{NaiveDate, NaiveDateTime, Weekday};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Type alias for a boxed future that returns a Result
pub type BoxFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// Whose existing appointment blocked an insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    Trainer,
    Member,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A live appointment already overlaps the requested interval.
    #[error("overlapping {0:?} appointment exists")]
    Conflict(ConflictKind),
    /// A compare-and-set status update found a different status than expected.
    #[error("appointment status changed concurrently")]
    StatusChanged,
    /// Transient contention (serialization failure, locked database). Safe to retry.
    #[error("storage is busy: {0}")]
    Busy(String),
    #[error("record not found")]
    NotFound,
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Extra checks performed atomically with an insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InsertGuard {
    /// Also reject the insert when the member has an overlapping live appointment that day.
    pub check_member: bool,
}

/// Storage operations the booking core depends on.
///
/// `insert_appointment` and `update_status` must be atomic with respect to
/// concurrent callers; everything else is a plain read or an idempotent write.
pub trait BookingStore: Send + Sync {
    /// Look up a service by id.
    fn service(&self, id: ServiceId) -> BoxFuture<'_, Option<Service>, StoreError>;

    /// The trainer's active window for a weekday, if any.
    fn active_window(
        &self,
        trainer_id: TrainerId,
        day: Weekday,
    ) -> BoxFuture<'_, Option<TrainerAvailability>, StoreError>;

    /// Intervals taken by live (not cancelled, not rejected) appointments of a trainer.
    fn busy_intervals(
        &self,
        trainer_id: TrainerId,
        date: NaiveDate,
    ) -> BoxFuture<'_, Vec<TimeRange>, StoreError>;

    /// Intervals taken by live appointments of a member.
    fn member_busy_intervals(
        &self,
        member_id: &MemberId,
        date: NaiveDate,
    ) -> BoxFuture<'_, Vec<TimeRange>, StoreError>;

    /// Re-check for overlaps and insert as a single atomic unit.
    ///
    /// Fails with [`StoreError::Conflict`] when a live appointment overlaps,
    /// or [`StoreError::Busy`] when the store could not serialise the attempt.
    fn insert_appointment(
        &self,
        appointment: NewAppointment,
        guard: InsertGuard,
    ) -> BoxFuture<'_, Appointment, StoreError>;

    fn appointment(&self, id: AppointmentId) -> BoxFuture<'_, Option<Appointment>, StoreError>;

    /// Move an appointment from `expected` to `next`.
    ///
    /// Fails with [`StoreError::StatusChanged`] if the stored status is no longer `expected`.
    fn update_status(
        &self,
        id: AppointmentId,
        expected: AppointmentStatus,
        next: AppointmentStatus,
        at: NaiveDateTime,
    ) -> BoxFuture<'_, Appointment, StoreError>;

    /// Appointments matching the filter, ordered by date then start time.
    fn list_appointments(
        &self,
        filter: AppointmentFilter,
    ) -> BoxFuture<'_, Vec<Appointment>, StoreError>;

    /// Insert or replace a service.
    fn upsert_service(&self, service: Service) -> BoxFuture<'_, (), StoreError>;

    /// Insert or replace the window for `(trainer_id, day_of_week)`.
    fn upsert_availability(&self, window: TrainerAvailability) -> BoxFuture<'_, (), StoreError>;
}
