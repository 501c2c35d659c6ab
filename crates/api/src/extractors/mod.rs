//! Custom Axum extractors.
//!
//! Extractors for authenticating callers and resolving their role.

pub mod user_auth;

pub use user_auth::{AttendeeAuth, OptionalUserAuth, OrganizerAuth, UserAuth};
