//! Review repository.

use sqlx::PgPool;

use crate::entities::ReviewEntity;
use crate::metrics::QueryTimer;

/// Repository for review database operations.
#[derive(Clone)]
pub struct ReviewRepository {
    pool: PgPool,
}

impl ReviewRepository {
    /// Creates a new ReviewRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert or replace the user's review of an event.
    pub async fn upsert(
        &self,
        user_id: i64,
        event_id: i64,
        rating: i32,
        comment: &str,
    ) -> Result<ReviewEntity, sqlx::Error> {
        let timer = QueryTimer::new("upsert_review");
        let result = sqlx::query_as::<_, ReviewEntity>(
            r#"
            INSERT INTO reviews (user_id, event_id, rating, comment)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, event_id)
            DO UPDATE SET rating = EXCLUDED.rating,
                          comment = EXCLUDED.comment,
                          created_at = NOW()
            RETURNING user_id, event_id, rating, comment, created_at
            "#,
        )
        .bind(user_id)
        .bind(event_id)
        .bind(rating)
        .bind(comment)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }
}
