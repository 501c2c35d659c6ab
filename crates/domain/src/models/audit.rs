//! Booking audit trail models.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::booking::BookingStatus;

/// Immutable record of an organizer-driven booking transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct BookingAuditEntry {
    pub id: i64,
    pub booking_id: i64,
    pub old_status: BookingStatus,
    pub new_status: BookingStatus,
    /// Organizer who performed the transition
    pub actor_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Audit entry to append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAuditEntry {
    pub booking_id: i64,
    pub old_status: BookingStatus,
    pub new_status: BookingStatus,
    pub actor_id: Option<i64>,
}
