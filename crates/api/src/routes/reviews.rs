//! Review endpoint handlers.

use axum::{extract::State, Json};
use domain::models::{Review, UpsertReviewRequest};
use domain::services::submit_review;
use serde::Serialize;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;

#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    pub ok: bool,
    pub review: Review,
}

/// Create or replace the caller's review of an event.
///
/// POST /api/reviews
pub async fn upsert_review(
    State(state): State<AppState>,
    user: UserAuth,
    Json(request): Json<UpsertReviewRequest>,
) -> Result<Json<ReviewResponse>, ApiError> {
    let review = submit_review(state.store.as_ref(), user.user_id, &request).await?;
    Ok(Json(ReviewResponse { ok: true, review }))
}
