use crate::logic::{
    format_time, parse_date, parse_time, AppointmentView, AppointmentsQuery, AvailableSlotsQuery,
    BookAppointmentRequest, BookingError, CancelAppointmentRequest, CancellationResponse,
    StatusLabelView,
};
use crate::service::{BookingRequest, BookingService};
use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use gymbook_common::models::{AppointmentId, MemberId, ServiceId, TrainerId, STATUS_LABELS};
use std::sync::Arc;
use tracing::info;

// Shared state needed by the booking handlers
#[derive(Clone)]
pub struct BookingState {
    pub service: BookingService,
}

/// Handler to list bookable start times for a trainer, service and day.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/available-slots",
    params(AvailableSlotsQuery),
    responses(
        (status = 200, description = "Bookable start times (HH:MM), ascending", body = Vec<String>),
        (status = 400, description = "Invalid date format"),
        (status = 500, description = "Storage error")
    ),
    tag = "Booking"
))]
pub async fn get_available_slots_handler(
    State(state): State<Arc<BookingState>>,
    query: Result<Query<AvailableSlotsQuery>, QueryRejection>,
) -> Result<Json<Vec<String>>, BookingError> {
    let Query(query) = query?;
    let date = parse_date(&query.date)?;
    info!(
        "Available slots requested for trainer {} service {} on {}",
        query.trainer_id, query.service_id, date
    );

    let slots = state
        .service
        .available_slots(TrainerId(query.trainer_id), date, ServiceId(query.service_id))
        .await?;

    Ok(Json(slots.into_iter().map(format_time).collect()))
}

/// Handler to book an appointment.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/appointments",
    request_body = BookAppointmentRequest,
    responses(
        (status = 201, description = "Appointment created in Pending state", body = AppointmentView),
        (status = 400, description = "Invalid request or unknown service"),
        (status = 409, description = "Slot taken or member already booked"),
        (status = 422, description = "Trainer unavailable or slot in the past")
    ),
    tag = "Booking"
))]
pub async fn book_appointment_handler(
    State(state): State<Arc<BookingState>>,
    payload: Result<Json<BookAppointmentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AppointmentView>), BookingError> {
    let Json(payload) = payload?;
    info!(
        "Booking request from member {} for trainer {} on {} at {}",
        payload.member_id, payload.trainer_id, payload.date, payload.start_time
    );

    if payload.member_id.trim().is_empty() {
        return Err(BookingError::InvalidRequest(
            "memberId must not be empty".to_string(),
        ));
    }
    let request = BookingRequest {
        member_id: MemberId::new(payload.member_id.trim()),
        trainer_id: TrainerId(payload.trainer_id),
        service_id: ServiceId(payload.service_id),
        date: parse_date(&payload.date)?,
        start_time: parse_time(&payload.start_time)?,
        notes: payload.notes,
    };

    let appointment = state.service.try_book(request).await?;
    Ok((StatusCode::CREATED, Json(AppointmentView::from(&appointment))))
}

/// Handler for a member cancelling their own appointment.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/appointments/{id}/cancel",
    params(("id" = i64, Path, description = "Appointment id")),
    request_body = CancelAppointmentRequest,
    responses(
        (status = 200, description = "Appointment cancelled", body = CancellationResponse),
        (status = 404, description = "No such appointment for this member"),
        (status = 409, description = "Appointment already cancelled or rejected"),
        (status = 422, description = "Inside the notice period or already completed")
    ),
    tag = "Booking"
))]
pub async fn cancel_appointment_handler(
    State(state): State<Arc<BookingState>>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<CancelAppointmentRequest>, JsonRejection>,
) -> Result<Json<CancellationResponse>, BookingError> {
    let Path(id) = id?;
    let Json(payload) = payload?;
    info!(
        "Cancellation of appointment {} requested by member {}",
        id, payload.member_id
    );

    state
        .service
        .cancel_by_member(AppointmentId(id), &MemberId::new(payload.member_id))
        .await?;

    Ok(Json(CancellationResponse {
        success: true,
        message: "Appointment cancelled successfully.".to_string(),
    }))
}

/// Handler to list appointments, e.g. a member's own or a trainer's day.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/appointments",
    params(AppointmentsQuery),
    responses(
        (status = 200, description = "Appointments ordered by date and start time", body = Vec<AppointmentView>),
        (status = 400, description = "Invalid date or status")
    ),
    tag = "Booking"
))]
pub async fn list_appointments_handler(
    State(state): State<Arc<BookingState>>,
    query: Result<Query<AppointmentsQuery>, QueryRejection>,
) -> Result<Json<Vec<AppointmentView>>, BookingError> {
    let Query(query) = query?;
    let filter = query.to_filter()?;
    info!("Listing appointments with {:?}", filter);

    let appointments = state.service.appointments(filter).await?;
    Ok(Json(
        appointments.iter().map(AppointmentView::from).collect(),
    ))
}

/// Handler for admin status changes: `approve`, `reject`, `complete` or `cancel`.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/admin/appointments/{id}/{action}",
    params(
        ("id" = i64, Path, description = "Appointment id"),
        ("action" = String, Path, description = "approve, reject, complete or cancel")
    ),
    responses(
        (status = 200, description = "Updated appointment", body = AppointmentView),
        (status = 404, description = "Unknown appointment or action"),
        (status = 409, description = "Transition not allowed from the current status")
    ),
    tag = "Admin"
))]
pub async fn admin_transition_handler(
    State(state): State<Arc<BookingState>>,
    path: Result<Path<(i64, String)>, PathRejection>,
) -> Result<Json<AppointmentView>, BookingError> {
    let Path((id, action)) = path?;
    info!("Admin action {} on appointment {}", action, id);

    let id = AppointmentId(id);
    let updated = match action.as_str() {
        "approve" => state.service.approve(id).await?,
        "reject" => state.service.reject(id).await?,
        "complete" => state.service.complete(id).await?,
        "cancel" => state.service.cancel_by_admin(id).await?,
        other => return Err(BookingError::NotFound(format!("Action {:?}", other))),
    };
    Ok(Json(AppointmentView::from(&updated)))
}

/// Handler returning every status code with its display label.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/appointment-statuses",
    responses(
        (status = 200, description = "Status codes and labels", body = Vec<StatusLabelView>)
    ),
    tag = "Booking"
))]
pub async fn get_appointment_statuses_handler() -> Json<Vec<StatusLabelView>> {
    Json(
        STATUS_LABELS
            .iter()
            .map(|&(_, code, label)| StatusLabelView {
                status: code.to_string(),
                label: label.to_string(),
            })
            .collect(),
    )
}
