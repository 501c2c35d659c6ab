//! Review domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A review left by an attendee. One per (user, event).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct Review {
    pub user_id: i64,
    pub event_id: i64,
    pub rating: i32,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// Request to create or replace the caller's review of an event.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct UpsertReviewRequest {
    pub event_id: i64,

    #[validate(range(min = 1, max = 5, message = "rating must be between 1 and 5"))]
    pub rating: i32,

    #[serde(default)]
    #[validate(length(max = 2000, message = "comment must be at most 2000 characters"))]
    pub comment: String,
}
