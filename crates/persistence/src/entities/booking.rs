//! Booking entities (database row mappings).

use chrono::{DateTime, Utc};
use domain::models::{Booking, BookingStatus, MyBookingItem, OrganizerBookingItem};
use sqlx::FromRow;

/// Database enum for booking status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "booking_status", rename_all = "lowercase")]
pub enum BookingStatusDb {
    Pending,
    Paid,
    Cancelled,
    Rejected,
}

impl From<BookingStatusDb> for BookingStatus {
    fn from(status: BookingStatusDb) -> Self {
        match status {
            BookingStatusDb::Pending => BookingStatus::Pending,
            BookingStatusDb::Paid => BookingStatus::Paid,
            BookingStatusDb::Cancelled => BookingStatus::Cancelled,
            BookingStatusDb::Rejected => BookingStatus::Rejected,
        }
    }
}

impl From<BookingStatus> for BookingStatusDb {
    fn from(status: BookingStatus) -> Self {
        match status {
            BookingStatus::Pending => BookingStatusDb::Pending,
            BookingStatus::Paid => BookingStatusDb::Paid,
            BookingStatus::Cancelled => BookingStatusDb::Cancelled,
            BookingStatus::Rejected => BookingStatusDb::Rejected,
        }
    }
}

/// Database row mapping for the bookings table.
#[derive(Debug, Clone, FromRow)]
pub struct BookingEntity {
    pub id: i64,
    pub event_id: i64,
    pub user_id: i64,
    pub qty: i32,
    pub status: BookingStatusDb,
    pub created_at: DateTime<Utc>,
}

impl From<BookingEntity> for Booking {
    fn from(entity: BookingEntity) -> Self {
        Self {
            id: entity.id,
            event_id: entity.event_id,
            user_id: entity.user_id,
            qty: entity.qty,
            status: entity.status.into(),
            created_at: entity.created_at,
        }
    }
}

/// Booking joined with its event title and booker, for organizer listings.
#[derive(Debug, Clone, FromRow)]
pub struct OrganizerBookingEntity {
    pub booking_id: i64,
    pub event_id: i64,
    pub event_title: String,
    pub user_id: i64,
    pub user_name: Option<String>,
    pub user_email: String,
    pub qty: i32,
    pub status: BookingStatusDb,
    pub created_at: DateTime<Utc>,
}

impl From<OrganizerBookingEntity> for OrganizerBookingItem {
    fn from(entity: OrganizerBookingEntity) -> Self {
        Self {
            booking_id: entity.booking_id,
            event_id: entity.event_id,
            event_title: entity.event_title,
            user_id: entity.user_id,
            user_name: entity.user_name,
            user_email: entity.user_email,
            qty: entity.qty,
            status: entity.status.into(),
            created_at: entity.created_at,
        }
    }
}

/// Booking joined with its event and the booker's review.
#[derive(Debug, Clone, FromRow)]
pub struct MyBookingEntity {
    pub booking_id: i64,
    pub event_id: i64,
    pub title: String,
    pub start_date: DateTime<Utc>,
    pub location: Option<String>,
    pub status: BookingStatusDb,
    pub qty: i32,
    pub my_rating: Option<i32>,
    pub my_comment: Option<String>,
}

impl From<MyBookingEntity> for MyBookingItem {
    fn from(entity: MyBookingEntity) -> Self {
        Self {
            booking_id: entity.booking_id,
            event_id: entity.event_id,
            title: entity.title,
            start_date: entity.start_date,
            location: entity.location,
            status: entity.status.into(),
            qty: entity.qty,
            my_rating: entity.my_rating,
            my_comment: entity.my_comment,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_conversion_is_lossless() {
        for status in [
            BookingStatus::Pending,
            BookingStatus::Paid,
            BookingStatus::Cancelled,
            BookingStatus::Rejected,
        ] {
            let db: BookingStatusDb = status.into();
            assert_eq!(BookingStatus::from(db), status);
        }
    }
}
