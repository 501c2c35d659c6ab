//! Domain models for the ticketing backend.

pub mod audit;
pub mod booking;
pub mod event;
pub mod review;

pub use audit::{BookingAuditEntry, NewAuditEntry};
pub use booking::{Booking, BookingStatus, MyBookingItem, OrganizerBookingItem};
pub use event::{
    Event, EventCapacity, EventFilter, EventListing, EventPatch, NewEvent, OrganizerEventItem,
};
pub use review::{Review, UpsertReviewRequest};
