//! Booking audit entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::BookingAuditEntry;
use sqlx::FromRow;

use super::booking::BookingStatusDb;

/// Database row mapping for the booking_audit table.
#[derive(Debug, Clone, FromRow)]
pub struct BookingAuditEntity {
    pub id: i64,
    pub booking_id: i64,
    pub old_status: BookingStatusDb,
    pub new_status: BookingStatusDb,
    pub actor_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl From<BookingAuditEntity> for BookingAuditEntry {
    fn from(entity: BookingAuditEntity) -> Self {
        Self {
            id: entity.id,
            booking_id: entity.booking_id,
            old_status: entity.old_status.into(),
            new_status: entity.new_status.into(),
            actor_id: entity.actor_id,
            created_at: entity.created_at,
        }
    }
}
