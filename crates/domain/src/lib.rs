//! Domain layer for the event ticketing backend.
//!
//! This crate contains:
//! - Typed records (Event, Booking, BookingAuditEntry, Review)
//! - The store, identity and notification seams the core depends on
//! - The booking-capacity state machine (capacity ledger, reservation
//!   engine, organizer approval workflow) and the catalog/review services
//! - Domain error types

pub mod error;
pub mod models;
pub mod services;
pub mod store;

pub use error::{DomainError, StoreError};
