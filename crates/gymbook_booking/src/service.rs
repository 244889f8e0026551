//! Availability resolution and the booking guard.
//!
//! Both work only through the [`BookingStore`] they are given. The guard
//! validates a request against fresh reads and then relies on the store's
//! atomic insert to close the race between concurrent bookings.

use crate::clock::{Clock, SystemClock};
use crate::logic::{calculate_available_slots, end_of_slot, BookingError, MAX_NOTES_LENGTH};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use gymbook_common::models::{
    Appointment, AppointmentFilter, AppointmentId, AppointmentStatus, MemberId, NewAppointment,
    Service, ServiceId, TimeRange, TrainerId,
};
use gymbook_common::{BookingStore, InsertGuard, StoreError};
use gymbook_config::BookingConfig;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Booking rules that differ between deployments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingPolicy {
    /// Reject bookings that overlap another live appointment of the same member.
    pub member_overlap_check: bool,
    /// Minimum notice for a member-initiated cancellation; zero disables the check.
    pub cancellation_notice: Duration,
    /// Attempts made when the store reports contention, for inserts and status updates alike.
    pub max_insert_attempts: u32,
}

impl BookingPolicy {
    pub fn from_config(config: &BookingConfig) -> Self {
        Self {
            member_overlap_check: config.member_overlap_check,
            cancellation_notice: Duration::hours(i64::from(config.cancellation_notice_hours)),
            max_insert_attempts: config.max_insert_attempts.max(1),
        }
    }
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self::from_config(&BookingConfig::default())
    }
}

/// A member's request for a slot, already parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingRequest {
    pub member_id: MemberId,
    pub trainer_id: TrainerId,
    pub service_id: ServiceId,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub notes: Option<String>,
}

#[derive(Clone)]
pub struct BookingService {
    store: Arc<dyn BookingStore>,
    clock: Arc<dyn Clock>,
    policy: BookingPolicy,
}

impl BookingService {
    pub fn new(store: Arc<dyn BookingStore>, clock: Arc<dyn Clock>, policy: BookingPolicy) -> Self {
        Self {
            store,
            clock,
            policy,
        }
    }

    /// Service on the system clock with the configured policy.
    pub fn from_config(store: Arc<dyn BookingStore>, config: &BookingConfig) -> Self {
        Self::new(
            store,
            Arc::new(SystemClock::new(config.time_zone.as_deref())),
            BookingPolicy::from_config(config),
        )
    }

    pub fn store(&self) -> &Arc<dyn BookingStore> {
        &self.store
    }

    pub fn policy(&self) -> &BookingPolicy {
        &self.policy
    }

    /// Inactive services are treated as unknown.
    async fn bookable_service(&self, id: ServiceId) -> Result<Option<Service>, StoreError> {
        Ok(self.store.service(id).await?.filter(|s| s.is_active))
    }

    /// Start times a member may currently book with `trainer_id` on `date`.
    ///
    /// An unknown trainer, day off, unknown service or fully booked day all
    /// yield an empty list. Only storage failures are errors.
    pub async fn available_slots(
        &self,
        trainer_id: TrainerId,
        date: NaiveDate,
        service_id: ServiceId,
    ) -> Result<Vec<NaiveTime>, BookingError> {
        let Some(window) = self
            .store
            .active_window(trainer_id, date.weekday())
            .await?
        else {
            debug!("Trainer {} has no window on {}", trainer_id, date.weekday());
            return Ok(Vec::new());
        };
        let Some(service) = self.bookable_service(service_id).await? else {
            debug!("Service {} is not bookable", service_id);
            return Ok(Vec::new());
        };

        let now = self.clock.now();
        if date < now.date() {
            return Ok(Vec::new());
        }
        let not_before = (date == now.date()).then(|| now.time());

        let busy = self.store.busy_intervals(trainer_id, date).await?;
        Ok(calculate_available_slots(
            window.window(),
            Duration::minutes(i64::from(service.duration_minutes)),
            &busy,
            not_before,
        ))
    }

    /// Validate `request` against current state and persist it as a `Pending` appointment.
    pub async fn try_book(&self, request: BookingRequest) -> Result<Appointment, BookingError> {
        let result = self.book(&request).await;
        match &result {
            Ok(appointment) => info!(
                "Booked appointment {} for member {} with trainer {} on {} at {}",
                appointment.id,
                appointment.member_id,
                appointment.trainer_id,
                appointment.date,
                appointment.start_time
            ),
            Err(BookingError::Store(e)) => error!("Booking failed on storage: {}", e),
            Err(e) => warn!(
                "Rejected booking by member {} with trainer {} on {} at {}: {}",
                request.member_id, request.trainer_id, request.date, request.start_time, e
            ),
        }
        result
    }

    async fn book(&self, request: &BookingRequest) -> Result<Appointment, BookingError> {
        let notes = request
            .notes
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty());
        if let Some(notes) = notes {
            if notes.chars().count() > MAX_NOTES_LENGTH {
                return Err(BookingError::InvalidRequest(format!(
                    "Notes must be at most {} characters",
                    MAX_NOTES_LENGTH
                )));
            }
        }

        let service = self
            .bookable_service(request.service_id)
            .await?
            .ok_or(BookingError::InvalidService(request.service_id))?;
        let duration = Duration::minutes(i64::from(service.duration_minutes));

        let window = self
            .store
            .active_window(request.trainer_id, request.date.weekday())
            .await?
            .ok_or(BookingError::TrainerUnavailable)?;
        let end_time =
            end_of_slot(request.start_time, duration).ok_or(BookingError::TrainerUnavailable)?;
        let requested = TimeRange::new(request.start_time, end_time);
        if !window.window().contains(&requested) {
            return Err(BookingError::TrainerUnavailable);
        }

        let now = self.clock.now();
        if request.date.and_time(request.start_time) < now {
            return Err(BookingError::SlotInPast);
        }

        let busy = self
            .store
            .busy_intervals(request.trainer_id, request.date)
            .await?;
        if busy.iter().any(|b| b.overlaps(&requested)) {
            return Err(BookingError::SlotConflict);
        }

        if self.policy.member_overlap_check {
            let own = self
                .store
                .member_busy_intervals(&request.member_id, request.date)
                .await?;
            if own.iter().any(|b| b.overlaps(&requested)) {
                return Err(BookingError::MemberDoubleBooked);
            }
        }

        let new = NewAppointment {
            member_id: request.member_id.clone(),
            trainer_id: request.trainer_id,
            service_id: service.id,
            date: request.date,
            start_time: request.start_time,
            end_time,
            price: service.price,
            notes: notes.map(str::to_string),
            created_at: now,
        };
        self.insert_with_retry(new).await
    }

    /// The reads above are advisory; the store re-checks atomically on insert.
    async fn insert_with_retry(&self, new: NewAppointment) -> Result<Appointment, BookingError> {
        let guard = InsertGuard {
            check_member: self.policy.member_overlap_check,
        };
        let attempts = self.policy.max_insert_attempts.max(1);
        for attempt in 1..=attempts {
            match self.store.insert_appointment(new.clone(), guard).await {
                Ok(created) => return Ok(created),
                Err(StoreError::Busy(reason)) => {
                    debug!(
                        "Insert attempt {}/{} hit contention: {}",
                        attempt, attempts, reason
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(BookingError::SlotConflict)
    }

    /// Cancel on behalf of the owning member, honouring the notice period.
    pub async fn cancel_by_member(
        &self,
        id: AppointmentId,
        member_id: &MemberId,
    ) -> Result<Appointment, BookingError> {
        let notice = self.policy.cancellation_notice;
        self.transition(id, AppointmentStatus::Cancelled, |appointment, now| {
            if appointment.member_id != *member_id {
                return Err(appointment_not_found(id));
            }
            match appointment.status {
                AppointmentStatus::Completed => return Err(BookingError::TooLateToCancel),
                AppointmentStatus::Cancelled | AppointmentStatus::Rejected => {
                    return Err(BookingError::InvalidTransition {
                        from: appointment.status,
                        to: AppointmentStatus::Cancelled,
                    })
                }
                AppointmentStatus::Pending | AppointmentStatus::Approved => {}
            }
            if notice > Duration::zero() && appointment.starts_at() - now < notice {
                return Err(BookingError::TooLateToCancel);
            }
            Ok(())
        })
        .await
    }

    pub async fn approve(&self, id: AppointmentId) -> Result<Appointment, BookingError> {
        self.transition(id, AppointmentStatus::Approved, |_, _| Ok(()))
            .await
    }

    pub async fn reject(&self, id: AppointmentId) -> Result<Appointment, BookingError> {
        self.transition(id, AppointmentStatus::Rejected, |_, _| Ok(()))
            .await
    }

    pub async fn complete(&self, id: AppointmentId) -> Result<Appointment, BookingError> {
        self.transition(id, AppointmentStatus::Completed, |_, _| Ok(()))
            .await
    }

    /// Admin cancellation skips the notice period.
    pub async fn cancel_by_admin(&self, id: AppointmentId) -> Result<Appointment, BookingError> {
        self.transition(id, AppointmentStatus::Cancelled, |_, _| Ok(()))
            .await
    }

    pub async fn appointment(&self, id: AppointmentId) -> Result<Appointment, BookingError> {
        self.store
            .appointment(id)
            .await?
            .ok_or_else(|| appointment_not_found(id))
    }

    /// Appointments matching `filter`, ordered by date then start time.
    pub async fn appointments(
        &self,
        filter: AppointmentFilter,
    ) -> Result<Vec<Appointment>, BookingError> {
        Ok(self.store.list_appointments(filter).await?)
    }

    /// Move `id` to `next` with a compare-and-set, re-reading when another
    /// writer changed the status first.
    async fn transition<F>(
        &self,
        id: AppointmentId,
        next: AppointmentStatus,
        check: F,
    ) -> Result<Appointment, BookingError>
    where
        F: Fn(&Appointment, NaiveDateTime) -> Result<(), BookingError>,
    {
        let attempts = self.policy.max_insert_attempts.max(1);
        let mut last_seen = None;
        for _ in 0..attempts {
            let current = self.appointment(id).await?;
            let now = self.clock.now();
            check(&current, now)?;
            if !current.status.can_transition_to(next) {
                return Err(BookingError::InvalidTransition {
                    from: current.status,
                    to: next,
                });
            }

            match self.store.update_status(id, current.status, next, now).await {
                Ok(updated) => {
                    info!(
                        "Appointment {} moved from {} to {}",
                        id, current.status, updated.status
                    );
                    return Ok(updated);
                }
                Err(StoreError::StatusChanged) | Err(StoreError::Busy(_)) => {
                    debug!("Appointment {} changed underneath {} update", id, next);
                    last_seen = Some(current.status);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(BookingError::InvalidTransition {
            from: last_seen.unwrap_or(next),
            to: next,
        })
    }
}

fn appointment_not_found(id: AppointmentId) -> BookingError {
    BookingError::NotFound(format!("Appointment {}", id))
}
