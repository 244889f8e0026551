#![cfg(feature = "openapi")]
use utoipa::OpenApi;

use crate::logic::{
    AppointmentView, AppointmentsQuery, AvailableSlotsQuery, BookAppointmentRequest,
    CancelAppointmentRequest, CancellationResponse, StatusLabelView,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::get_available_slots_handler,
        crate::handlers::book_appointment_handler,
        crate::handlers::cancel_appointment_handler,
        crate::handlers::list_appointments_handler,
        crate::handlers::admin_transition_handler,
        crate::handlers::get_appointment_statuses_handler
    ),
    components(
        schemas(
            AvailableSlotsQuery,
            BookAppointmentRequest,
            AppointmentView,
            CancelAppointmentRequest,
            CancellationResponse,
            AppointmentsQuery,
            StatusLabelView
        )
    ),
    tags(
        (name = "Booking", description = "Trainer availability and member bookings"),
        (name = "Admin", description = "Appointment approval workflow")
    ),
    servers(
        (url = "/api", description = "Gym booking API server")
    )
)]
pub struct BookingApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = BookingApiDoc::openapi();
        for path in [
            "/available-slots",
            "/appointments",
            "/appointments/{id}/cancel",
            "/admin/appointments/{id}/{action}",
            "/appointment-statuses",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
