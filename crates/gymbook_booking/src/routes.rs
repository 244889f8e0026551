use crate::handlers::{
    admin_transition_handler, book_appointment_handler, cancel_appointment_handler,
    get_appointment_statuses_handler, get_available_slots_handler, list_appointments_handler,
    BookingState,
};
use crate::service::BookingService;
use axum::{
    routing::{get, post},
    Router,
};
use gymbook_common::BookingStore;
use gymbook_config::AppConfig;
use std::sync::Arc;

/// Creates a router containing all booking routes, backed by `store` and the
/// configured booking policy. Meant to be nested under `/api`.
pub fn routes(config: Arc<AppConfig>, store: Arc<dyn BookingStore>) -> Router {
    routes_with_service(BookingService::from_config(store, &config.booking))
}

/// Same routes around an already assembled service.
pub fn routes_with_service(service: BookingService) -> Router {
    let state = Arc::new(BookingState { service });

    Router::new()
        .route("/available-slots", get(get_available_slots_handler))
        .route(
            "/appointments",
            get(list_appointments_handler).post(book_appointment_handler),
        )
        .route("/appointments/{id}/cancel", post(cancel_appointment_handler))
        .route(
            "/admin/appointments/{id}/{action}",
            post(admin_transition_handler),
        )
        .route(
            "/appointment-statuses",
            get(get_appointment_statuses_handler),
        )
        .with_state(state)
}
