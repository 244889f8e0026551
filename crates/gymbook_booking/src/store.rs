//! In-process [`BookingStore`].
//!
//! Every operation takes the same mutex, so an overlap check and the insert
//! that follows it form one critical section.

use chrono::{NaiveDate, NaiveDateTime, Weekday};
use gymbook_common::models::{
    Appointment, AppointmentFilter, AppointmentId, AppointmentStatus, MemberId, NewAppointment,
    Service, ServiceId, TimeRange, TrainerAvailability, TrainerId,
};
use gymbook_common::{BookingStore, BoxFuture, ConflictKind, InsertGuard, StoreError};
use std::collections::{BTreeMap, HashMap};
use std::future::ready;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct Tables {
    services: HashMap<ServiceId, Service>,
    windows: HashMap<(TrainerId, Weekday), TrainerAvailability>,
    appointments: BTreeMap<AppointmentId, Appointment>,
    last_id: i64,
}

impl Tables {
    fn live_ranges<'a>(
        &'a self,
        date: NaiveDate,
        owner: impl Fn(&Appointment) -> bool + 'a,
    ) -> impl Iterator<Item = TimeRange> + 'a {
        self.appointments
            .values()
            .filter(move |a| a.date == date && a.status.is_live() && owner(a))
            .map(Appointment::time_range)
    }

    fn sorted_ranges(ranges: impl Iterator<Item = TimeRange>) -> Vec<TimeRange> {
        let mut ranges: Vec<_> = ranges.collect();
        ranges.sort_by_key(|r| (r.start, r.end));
        ranges
    }
}

#[derive(Debug, Default)]
pub struct MemoryBookingStore {
    tables: Mutex<Tables>,
}

impl MemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of stored appointments, whatever their status.
    pub fn len(&self) -> usize {
        self.tables().appointments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl BookingStore for MemoryBookingStore {
    fn service(&self, id: ServiceId) -> BoxFuture<'_, Option<Service>, StoreError> {
        let found = self.tables().services.get(&id).cloned();
        Box::pin(ready(Ok(found)))
    }

    fn active_window(
        &self,
        trainer_id: TrainerId,
        day: Weekday,
    ) -> BoxFuture<'_, Option<TrainerAvailability>, StoreError> {
        let found = self
            .tables()
            .windows
            .get(&(trainer_id, day))
            .filter(|w| w.is_active)
            .cloned();
        Box::pin(ready(Ok(found)))
    }

    fn busy_intervals(
        &self,
        trainer_id: TrainerId,
        date: NaiveDate,
    ) -> BoxFuture<'_, Vec<TimeRange>, StoreError> {
        let tables = self.tables();
        let busy = Tables::sorted_ranges(tables.live_ranges(date, |a| a.trainer_id == trainer_id));
        Box::pin(ready(Ok(busy)))
    }

    fn member_busy_intervals(
        &self,
        member_id: &MemberId,
        date: NaiveDate,
    ) -> BoxFuture<'_, Vec<TimeRange>, StoreError> {
        let tables = self.tables();
        let busy = Tables::sorted_ranges(tables.live_ranges(date, |a| a.member_id == *member_id));
        Box::pin(ready(Ok(busy)))
    }

    fn insert_appointment(
        &self,
        appointment: NewAppointment,
        guard: InsertGuard,
    ) -> BoxFuture<'_, Appointment, StoreError> {
        let mut tables = self.tables();
        let requested = appointment.time_range();

        let trainer_taken = tables
            .live_ranges(appointment.date, |a| a.trainer_id == appointment.trainer_id)
            .any(|r| r.overlaps(&requested));
        let member_taken = guard.check_member
            && tables
                .live_ranges(appointment.date, |a| a.member_id == appointment.member_id)
                .any(|r| r.overlaps(&requested));

        let result = if trainer_taken {
            Err(StoreError::Conflict(ConflictKind::Trainer))
        } else if member_taken {
            Err(StoreError::Conflict(ConflictKind::Member))
        } else {
            tables.last_id += 1;
            let created = Appointment {
                id: AppointmentId(tables.last_id),
                member_id: appointment.member_id,
                trainer_id: appointment.trainer_id,
                service_id: appointment.service_id,
                date: appointment.date,
                start_time: appointment.start_time,
                end_time: appointment.end_time,
                status: AppointmentStatus::Pending,
                price: appointment.price,
                notes: appointment.notes,
                created_at: appointment.created_at,
                updated_at: None,
            };
            tables.appointments.insert(created.id, created.clone());
            Ok(created)
        };
        Box::pin(ready(result))
    }

    fn appointment(&self, id: AppointmentId) -> BoxFuture<'_, Option<Appointment>, StoreError> {
        let found = self.tables().appointments.get(&id).cloned();
        Box::pin(ready(Ok(found)))
    }

    fn update_status(
        &self,
        id: AppointmentId,
        expected: AppointmentStatus,
        next: AppointmentStatus,
        at: NaiveDateTime,
    ) -> BoxFuture<'_, Appointment, StoreError> {
        let mut tables = self.tables();
        let result = match tables.appointments.get_mut(&id) {
            None => Err(StoreError::NotFound),
            Some(appointment) if appointment.status != expected => Err(StoreError::StatusChanged),
            Some(appointment) => {
                appointment.status = next;
                appointment.updated_at = Some(at);
                Ok(appointment.clone())
            }
        };
        Box::pin(ready(result))
    }

    fn list_appointments(
        &self,
        filter: AppointmentFilter,
    ) -> BoxFuture<'_, Vec<Appointment>, StoreError> {
        let mut found: Vec<_> = self
            .tables()
            .appointments
            .values()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect();
        found.sort_by_key(|a| (a.date, a.start_time, a.id));
        Box::pin(ready(Ok(found)))
    }

    fn upsert_service(&self, service: Service) -> BoxFuture<'_, (), StoreError> {
        self.tables().services.insert(service.id, service);
        Box::pin(ready(Ok(())))
    }

    fn upsert_availability(&self, window: TrainerAvailability) -> BoxFuture<'_, (), StoreError> {
        self.tables()
            .windows
            .insert((window.trainer_id, window.day_of_week), window);
        Box::pin(ready(Ok(())))
    }
}
