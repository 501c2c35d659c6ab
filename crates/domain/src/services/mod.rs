//! Domain services for the ticketing backend.
//!
//! Services hold the booking-capacity rules and operate on an injected store.

pub mod approval;
pub mod capacity;
pub mod catalog;
pub mod notification;
pub mod reservation;
pub mod review;

pub use approval::{ApprovalWorkflow, TransitionOutcome};
pub use capacity::{CapacityBasis, CapacitySnapshot};
pub use catalog::EventCatalog;
pub use notification::{
    BookingNotification, BookingNotificationKind, BookingNotifier, RecordingNotifier,
    TracingNotifier,
};
pub use reservation::ReservationEngine;
pub use review::submit_review;
