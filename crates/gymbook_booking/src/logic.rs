use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::response::{IntoResponse, Response};
use chrono::{Duration, NaiveDate, NaiveTime};
use gymbook_common::models::{
    Appointment, AppointmentFilter, AppointmentStatus, MemberId, ServiceId, TimeRange, TrainerId,
};
use gymbook_common::{error_response, ConflictKind, HttpStatusCode, StoreError};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// Fixed spacing between candidate start times.
pub const SLOT_STEP_MINUTES: i64 = 30;
/// Longest accepted `notes` text, in characters.
pub const MAX_NOTES_LENGTH: usize = 500;
/// Accepted range for a service's session length.
pub const MIN_SERVICE_MINUTES: u32 = 15;
pub const MAX_SERVICE_MINUTES: u32 = 180;

const TIME_FORMAT: &str = "%H:%M";
const DATE_FORMAT: &str = "%Y-%m-%d";

// --- Error Handling ---
use thiserror::Error;
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookingError {
    #[error("Service {0} does not exist or is not offered")]
    InvalidService(ServiceId),
    #[error("Trainer is not available at the requested time")]
    TrainerUnavailable,
    #[error("Requested time slot is no longer available")]
    SlotConflict,
    #[error("Member already has an appointment at that time")]
    MemberDoubleBooked,
    #[error("Appointment can no longer be cancelled")]
    TooLateToCancel,
    #[error("{0} not found")]
    NotFound(String),
    #[error("Cannot move appointment from {from} to {to}")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Requested start time has already passed")]
    SlotInPast,
    #[error("Storage error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for BookingError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(ConflictKind::Trainer) => BookingError::SlotConflict,
            StoreError::Conflict(ConflictKind::Member) => BookingError::MemberDoubleBooked,
            StoreError::NotFound => BookingError::NotFound("Record".to_string()),
            other => BookingError::Store(other),
        }
    }
}

impl From<QueryRejection> for BookingError {
    fn from(rejection: QueryRejection) -> Self {
        BookingError::InvalidRequest(rejection.body_text())
    }
}

impl From<JsonRejection> for BookingError {
    fn from(rejection: JsonRejection) -> Self {
        BookingError::InvalidRequest(rejection.body_text())
    }
}

impl From<PathRejection> for BookingError {
    fn from(rejection: PathRejection) -> Self {
        BookingError::InvalidRequest(rejection.body_text())
    }
}

impl HttpStatusCode for BookingError {
    fn status_code(&self) -> u16 {
        match self {
            BookingError::InvalidService(_) | BookingError::InvalidRequest(_) => 400,
            BookingError::NotFound(_) => 404,
            BookingError::SlotConflict
            | BookingError::MemberDoubleBooked
            | BookingError::InvalidTransition { .. } => 409,
            BookingError::TrainerUnavailable
            | BookingError::SlotInPast
            | BookingError::TooLateToCancel => 422,
            BookingError::Store(_) => 500,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            BookingError::InvalidService(_) => "invalid_service",
            BookingError::TrainerUnavailable => "trainer_unavailable",
            BookingError::SlotConflict => "slot_conflict",
            BookingError::MemberDoubleBooked => "member_double_booked",
            BookingError::TooLateToCancel => "too_late_to_cancel",
            BookingError::NotFound(_) => "not_found",
            BookingError::InvalidTransition { .. } => "invalid_transition",
            BookingError::InvalidRequest(_) => "invalid_request",
            BookingError::SlotInPast => "slot_in_past",
            BookingError::Store(_) => "storage",
        }
    }
}

impl IntoResponse for BookingError {
    fn into_response(self) -> Response {
        error_response(&self)
    }
}

// --- Data Structures ---
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams, utoipa::ToSchema))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct AvailableSlotsQuery {
    #[cfg_attr(feature = "openapi", schema(example = 7))]
    pub trainer_id: i64,
    #[cfg_attr(feature = "openapi", schema(example = 1))]
    pub service_id: i64,
    /// Day in YYYY-MM-DD format
    #[cfg_attr(feature = "openapi", schema(format = "date", example = "2025-05-05"))]
    pub date: String,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct BookAppointmentRequest {
    #[cfg_attr(feature = "openapi", schema(example = "member-42"))]
    pub member_id: String,
    pub trainer_id: i64,
    pub service_id: i64,
    #[cfg_attr(feature = "openapi", schema(format = "date", example = "2025-05-05"))]
    pub date: String,
    #[cfg_attr(feature = "openapi", schema(example = "10:30"))]
    pub start_time: String,
    pub notes: Option<String>,
}

/// Appointment as rendered to API clients.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct AppointmentView {
    pub appointment_id: i64,
    pub member_id: String,
    pub trainer_id: i64,
    pub service_id: i64,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    #[cfg_attr(feature = "openapi", schema(example = "Pending"))]
    pub status: String,
    #[cfg_attr(feature = "openapi", schema(example = "Awaiting approval"))]
    pub status_label: String,
    /// Smallest currency unit
    pub price: i64,
    pub notes: Option<String>,
}

impl From<&Appointment> for AppointmentView {
    fn from(appointment: &Appointment) -> Self {
        Self {
            appointment_id: appointment.id.0,
            member_id: appointment.member_id.to_string(),
            trainer_id: appointment.trainer_id.0,
            service_id: appointment.service_id.0,
            date: appointment.date.format(DATE_FORMAT).to_string(),
            start_time: format_time(appointment.start_time),
            end_time: format_time(appointment.end_time),
            status: appointment.status.code().to_string(),
            status_label: appointment.status.label().to_string(),
            price: appointment.price,
            notes: appointment.notes.clone(),
        }
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct CancelAppointmentRequest {
    pub member_id: String,
}

#[derive(Serialize, Deserialize, Debug)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct CancellationResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams, utoipa::ToSchema))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct AppointmentsQuery {
    pub member_id: Option<String>,
    pub trainer_id: Option<i64>,
    /// Day in YYYY-MM-DD format
    pub date: Option<String>,
    /// Status code, e.g. `Pending`
    pub status: Option<String>,
}

impl AppointmentsQuery {
    pub fn to_filter(&self) -> Result<AppointmentFilter, BookingError> {
        Ok(AppointmentFilter {
            member_id: self.member_id.as_deref().map(MemberId::new),
            trainer_id: self.trainer_id.map(TrainerId),
            date: self.date.as_deref().map(parse_date).transpose()?,
            status: self
                .status
                .as_deref()
                .map(|s| {
                    s.parse::<AppointmentStatus>()
                        .map_err(|e| BookingError::InvalidRequest(e.to_string()))
                })
                .transpose()?,
        })
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct StatusLabelView {
    pub status: String,
    pub label: String,
}

// --- Availability Logic ---

/// End of a slot starting at `start`, or `None` if it would run past midnight.
pub fn end_of_slot(start: NaiveTime, duration: Duration) -> Option<NaiveTime> {
    let (end, wrapped_secs) = start.overflowing_add_signed(duration);
    (wrapped_secs == 0).then_some(end)
}

/// Bookable start times inside `window`, in ascending order.
///
/// Candidates start at `window.start` and advance by [`SLOT_STEP_MINUTES`]. A
/// candidate is kept when its whole `[start, start + duration)` range fits in
/// the window, overlaps none of `busy` and does not start before `not_before`.
pub fn calculate_available_slots(
    window: TimeRange,
    duration: Duration,
    busy: &[TimeRange],
    not_before: Option<NaiveTime>,
) -> Vec<NaiveTime> {
    let mut slots = Vec::new();
    if duration <= Duration::zero() {
        return slots;
    }
    let step = Duration::minutes(SLOT_STEP_MINUTES);

    debug!(
        "Calculating slots in {}-{} for {} min, {} busy intervals",
        window.start,
        window.end,
        duration.num_minutes(),
        busy.len()
    );

    let mut candidate = window.start;
    while let Some(end) = end_of_slot(candidate, duration) {
        if end > window.end {
            break;
        }
        let range = TimeRange::new(candidate, end);
        let in_past = not_before.is_some_and(|now| candidate < now);
        if !in_past && !busy.iter().any(|b| b.overlaps(&range)) {
            slots.push(candidate);
        }
        match end_of_slot(candidate, step) {
            Some(next) => candidate = next,
            None => break,
        }
    }
    slots
}

pub fn format_time(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

pub fn parse_time(value: &str) -> Result<NaiveTime, BookingError> {
    NaiveTime::parse_from_str(value.trim(), TIME_FORMAT).map_err(|_| {
        BookingError::InvalidRequest(format!("Invalid time {:?} (HH:MM)", value))
    })
}

pub fn parse_date(value: &str) -> Result<NaiveDate, BookingError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| {
        BookingError::InvalidRequest(format!("Invalid date {:?} (YYYY-MM-DD)", value))
    })
}
