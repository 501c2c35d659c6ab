//! User repository for identity and ownership lookups.

use sqlx::PgPool;

use crate::metrics::QueryTimer;

/// Repository for organizer membership and ownership queries.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Creates a new UserRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Whether the user has an organizer profile.
    pub async fn is_organizer(&self, user_id: i64) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("is_organizer");
        let result = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM organizers WHERE user_id = $1)",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Organizer that owns the event.
    pub async fn event_owner(&self, event_id: i64) -> Result<Option<i64>, sqlx::Error> {
        let timer = QueryTimer::new("find_event_owner");
        let result = sqlx::query_scalar::<_, i64>("SELECT organizer_id FROM events WHERE id = $1")
            .bind(event_id)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Organizer that owns the booking's event.
    pub async fn booking_owner(&self, booking_id: i64) -> Result<Option<i64>, sqlx::Error> {
        let timer = QueryTimer::new("find_booking_owner");
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT e.organizer_id
            FROM bookings b
            JOIN events e ON e.id = b.event_id
            WHERE b.id = $1
            "#,
        )
        .bind(booking_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }
}
