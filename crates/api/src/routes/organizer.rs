//! Organizer booking endpoint handlers.
//!
//! Ownership of the target booking is checked here before the approval
//! workflow runs.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use domain::models::booking::{ListBookingsQuery, TransitionResponse};
use domain::models::{BookingAuditEntry, OrganizerBookingItem};
use domain::services::{
    ApprovalWorkflow, BookingNotification, BookingNotificationKind, TransitionOutcome,
};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::OrganizerAuth;

/// Bookings on the caller's events with the given status (default pending).
///
/// GET /api/organizer/bookings?status=pending|paid|cancelled|rejected
pub async fn list_bookings(
    State(state): State<AppState>,
    organizer: OrganizerAuth,
    Query(query): Query<ListBookingsQuery>,
) -> Result<Json<Vec<OrganizerBookingItem>>, ApiError> {
    let status = query.status()?;
    let items = ApprovalWorkflow::new(state.store.as_ref())
        .list_by_status(organizer.organizer_id, status)
        .await?;
    Ok(Json(items))
}

/// Approve a pending booking if paid capacity allows.
///
/// POST /api/organizer/booking/:booking_id/approve
pub async fn approve(
    State(state): State<AppState>,
    organizer: OrganizerAuth,
    Path(booking_id): Path<i64>,
) -> Result<Json<TransitionResponse>, ApiError> {
    organizer.ensure_owner(state.store.booking_owner(booking_id).await?, "booking")?;

    let outcome = ApprovalWorkflow::new(state.store.as_ref())
        .approve(booking_id, organizer.organizer_id)
        .await?;

    Ok(Json(
        publish(&state, &organizer, outcome, BookingNotificationKind::Approved).await,
    ))
}

/// Reject a pending booking.
///
/// POST /api/organizer/booking/:booking_id/reject
pub async fn reject(
    State(state): State<AppState>,
    organizer: OrganizerAuth,
    Path(booking_id): Path<i64>,
) -> Result<Json<TransitionResponse>, ApiError> {
    organizer.ensure_owner(state.store.booking_owner(booking_id).await?, "booking")?;

    let outcome = ApprovalWorkflow::new(state.store.as_ref())
        .reject(booking_id, organizer.organizer_id)
        .await?;

    Ok(Json(
        publish(&state, &organizer, outcome, BookingNotificationKind::Rejected).await,
    ))
}

/// Status history of a booking on one of the caller's events.
///
/// GET /api/organizer/booking/:booking_id/audit
pub async fn audit_trail(
    State(state): State<AppState>,
    organizer: OrganizerAuth,
    Path(booking_id): Path<i64>,
) -> Result<Json<Vec<BookingAuditEntry>>, ApiError> {
    organizer.ensure_owner(state.store.booking_owner(booking_id).await?, "booking")?;

    let entries = ApprovalWorkflow::new(state.store.as_ref())
        .audit_trail(booking_id)
        .await?;
    Ok(Json(entries))
}

/// Announces a transition that changed a row. Lost races stay silent.
async fn publish(
    state: &AppState,
    organizer: &OrganizerAuth,
    outcome: TransitionOutcome,
    kind: BookingNotificationKind,
) -> TransitionResponse {
    if outcome.updated == 1 {
        state.event_cache.invalidate();
        let notification = BookingNotification {
            status: outcome.to,
            ..BookingNotification::for_booking(kind, &outcome.booking, Some(organizer.organizer_id))
        };
        state.notifier.notify(notification).await;
    }

    TransitionResponse {
        ok: true,
        updated: outcome.updated,
    }
}
