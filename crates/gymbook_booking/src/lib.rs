// Declare modules within this crate
pub mod catalog;
pub mod clock;
pub mod doc;
pub mod handlers;
pub mod logic;
#[cfg(test)]
mod logic_proptest;
pub mod routes;
pub mod service;
pub mod store;

pub use logic::BookingError;
pub use routes::{routes, routes_with_service};
pub use service::{BookingPolicy, BookingRequest, BookingService};
pub use store::MemoryBookingStore;
