//! Booking repository for read-side queries.

use sqlx::PgPool;

use crate::entities::{
    BookingAuditEntity, BookingStatusDb, MyBookingEntity, OrganizerBookingEntity,
};
use crate::metrics::QueryTimer;

/// Repository for booking listings and audit trails.
#[derive(Clone)]
pub struct BookingRepository {
    pool: PgPool,
}

impl BookingRepository {
    /// Creates a new BookingRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Bookings with the given status on events owned by the organizer, newest first.
    pub async fn list_for_organizer(
        &self,
        organizer_id: i64,
        status: BookingStatusDb,
    ) -> Result<Vec<OrganizerBookingEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_bookings_for_organizer");
        let result = sqlx::query_as::<_, OrganizerBookingEntity>(
            r#"
            SELECT b.id AS booking_id, b.event_id, e.title AS event_title,
                   b.user_id, u.full_name AS user_name, u.email AS user_email,
                   b.qty, b.status, b.created_at
            FROM bookings b
            JOIN events e ON e.id = b.event_id
            JOIN users u ON u.id = b.user_id
            WHERE e.organizer_id = $1 AND b.status = $2
            ORDER BY b.created_at DESC, b.id DESC
            "#,
        )
        .bind(organizer_id)
        .bind(status)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// The user's bookings joined with their review, ordered by event start.
    pub async fn list_for_user(&self, user_id: i64) -> Result<Vec<MyBookingEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_bookings_for_user");
        let result = sqlx::query_as::<_, MyBookingEntity>(
            r#"
            SELECT b.id AS booking_id, e.id AS event_id, e.title, e.start_date, e.location,
                   b.status, b.qty, r.rating AS my_rating, r.comment AS my_comment
            FROM bookings b
            JOIN events e ON e.id = b.event_id
            LEFT JOIN reviews r ON r.event_id = e.id AND r.user_id = b.user_id
            WHERE b.user_id = $1
            ORDER BY e.start_date ASC, b.id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Audit entries for a booking, oldest first.
    pub async fn audit_trail(
        &self,
        booking_id: i64,
    ) -> Result<Vec<BookingAuditEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_booking_audit");
        let result = sqlx::query_as::<_, BookingAuditEntity>(
            r#"
            SELECT id, booking_id, old_status, new_status, actor_id, created_at
            FROM booking_audit
            WHERE booking_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }
}
