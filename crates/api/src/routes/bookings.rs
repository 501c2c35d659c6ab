//! Attendee booking endpoint handlers.

use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use domain::models::booking::{CancelResponse, ReserveRequest, ReserveResponse};
use domain::models::{BookingStatus, MyBookingItem};
use domain::services::{BookingNotification, BookingNotificationKind, ReservationEngine};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{AttendeeAuth, UserAuth};

/// Reads the optional `{qty}` body. An empty body means the defaults.
fn parse_reserve_body(body: &[u8]) -> Result<ReserveRequest, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ReserveRequest::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| ApiError::Validation(format!("Invalid request body: {}", e)))
}

/// Reserve capacity on an event as a pending booking.
///
/// POST /api/event/:event_id/book
pub async fn reserve(
    State(state): State<AppState>,
    attendee: AttendeeAuth,
    Path(event_id): Path<i64>,
    body: Bytes,
) -> Result<Json<ReserveResponse>, ApiError> {
    let request = parse_reserve_body(&body)?;

    let booking = ReservationEngine::new(state.store.as_ref())
        .reserve(event_id, attendee.user_id, request.qty)
        .await?;
    state.event_cache.invalidate();

    state
        .notifier
        .notify(BookingNotification::for_booking(
            BookingNotificationKind::Requested,
            &booking,
            None,
        ))
        .await;

    Ok(Json(ReserveResponse {
        ok: true,
        booking_id: booking.id,
        status: booking.status,
    }))
}

/// Cancel the caller's pending booking on an event.
///
/// DELETE /api/event/:event_id/book
pub async fn cancel(
    State(state): State<AppState>,
    attendee: AttendeeAuth,
    Path(event_id): Path<i64>,
) -> Result<Json<CancelResponse>, ApiError> {
    let cancelled = ReservationEngine::new(state.store.as_ref())
        .cancel(event_id, attendee.user_id)
        .await?;
    state.event_cache.invalidate();

    for booking_id in &cancelled {
        state
            .notifier
            .notify(BookingNotification {
                kind: BookingNotificationKind::Cancelled,
                booking_id: *booking_id,
                event_id,
                user_id: attendee.user_id,
                status: BookingStatus::Cancelled,
                actor_id: None,
                timestamp: Utc::now(),
            })
            .await;
    }

    Ok(Json(CancelResponse {
        ok: true,
        cancelled: cancelled.len() as u64,
    }))
}

/// The caller's bookings with their reviews, ordered by event start.
///
/// GET /api/my-bookings
pub async fn my_bookings(
    State(state): State<AppState>,
    user: UserAuth,
) -> Result<Json<Vec<MyBookingItem>>, ApiError> {
    let items = state.store.list_for_user(user.user_id).await?;
    Ok(Json(items))
}
