//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod audit;
pub mod booking;
pub mod event;
pub mod review;

pub use audit::BookingAuditEntity;
pub use booking::{BookingEntity, BookingStatusDb, MyBookingEntity, OrganizerBookingEntity};
pub use event::{EventCapacityEntity, EventEntity, EventListingEntity, OrganizerEventEntity};
pub use review::ReviewEntity;
