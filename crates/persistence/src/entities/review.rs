//! Review entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::Review;
use sqlx::FromRow;

/// Database row mapping for the reviews table.
#[derive(Debug, Clone, FromRow)]
pub struct ReviewEntity {
    pub user_id: i64,
    pub event_id: i64,
    pub rating: i32,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

impl From<ReviewEntity> for Review {
    fn from(entity: ReviewEntity) -> Self {
        Self {
            user_id: entity.user_id,
            event_id: entity.event_id,
            rating: entity.rating,
            comment: entity.comment,
            created_at: entity.created_at,
        }
    }
}
