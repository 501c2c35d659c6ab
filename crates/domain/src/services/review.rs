//! Review ledger.

use tracing::info;
use validator::Validate;

use crate::error::{DomainError, StoreError};
use crate::models::{Review, UpsertReviewRequest};
use crate::store::ReviewStore;

/// Records the user's review of an event, replacing any earlier one.
pub async fn submit_review<S: ReviewStore + ?Sized>(
    store: &S,
    user_id: i64,
    request: &UpsertReviewRequest,
) -> Result<Review, DomainError> {
    request.validate()?;

    let review = store
        .upsert_review(user_id, request.event_id, request.rating, &request.comment)
        .await
        .map_err(|e| match e {
            StoreError::MissingReference(_) => DomainError::NotFound("event"),
            other => other.into(),
        })?;

    info!(user_id, event_id = request.event_id, rating = request.rating, "Review saved");
    Ok(review)
}
