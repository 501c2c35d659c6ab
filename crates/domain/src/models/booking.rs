//! Booking domain models.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Lifecycle status of a booking.
///
/// `pending` is the only non-terminal state. `pending` and `paid` count as
/// active and hold capacity against the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Paid,
    Cancelled,
    Rejected,
}

impl BookingStatus {
    /// Statuses that hold capacity and count toward the one-booking-per-event rule.
    pub const ACTIVE: [BookingStatus; 2] = [BookingStatus::Pending, BookingStatus::Paid];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Paid => "paid",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "paid" => Ok(BookingStatus::Paid),
            "cancelled" => Ok(BookingStatus::Cancelled),
            "rejected" => Ok(BookingStatus::Rejected),
            other => Err(DomainError::BadStatus(other.to_string())),
        }
    }
}

/// A booking row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Booking {
    pub id: i64,
    pub event_id: i64,
    pub user_id: i64,
    pub qty: i32,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

fn default_qty() -> i64 {
    1
}

/// Request body for reserving capacity on an event.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ReserveRequest {
    /// Number of units (default: 1)
    #[serde(default = "default_qty")]
    pub qty: i64,
}

impl Default for ReserveRequest {
    fn default() -> Self {
        Self { qty: default_qty() }
    }
}

/// Response after a successful reservation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ReserveResponse {
    pub ok: bool,
    pub booking_id: i64,
    pub status: BookingStatus,
}

/// Response after cancelling a pending booking.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct CancelResponse {
    pub ok: bool,
    pub cancelled: u64,
}

/// Response after an organizer transition. `updated` is 0 when a concurrent
/// transition won the race.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct TransitionResponse {
    pub ok: bool,
    pub updated: u64,
}

/// Booking as seen by the organizer of its event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct OrganizerBookingItem {
    pub booking_id: i64,
    pub event_id: i64,
    pub event_title: String,
    pub user_id: i64,
    pub user_name: Option<String>,
    pub user_email: String,
    pub qty: i32,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

/// Booking as seen by the attendee who holds it, joined with their review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct MyBookingItem {
    pub booking_id: i64,
    pub event_id: i64,
    pub title: String,
    pub start_date: DateTime<Utc>,
    pub location: Option<String>,
    pub status: BookingStatus,
    pub qty: i32,
    pub my_rating: Option<i32>,
    pub my_comment: Option<String>,
}

/// Query parameters for the organizer booking listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListBookingsQuery {
    pub status: Option<String>,
}

impl ListBookingsQuery {
    /// Resolves the requested status, defaulting to `pending`.
    pub fn status(&self) -> Result<BookingStatus, DomainError> {
        match self.status.as_deref() {
            None | Some("") => Ok(BookingStatus::Pending),
            Some(value) => value.parse(),
        }
    }
}
