//! Organizer approval workflow.
//!
//! Approve and reject re-read the booking inside a transaction and finish
//! with a status-guarded update, so a concurrent transition on the same
//! booking shows up as `updated = 0` instead of a double transition. An
//! audit entry is appended only when the update actually changed the row.

use metrics::counter;
use tracing::{debug, info, instrument, warn};

use super::capacity::{self, CapacityBasis};
use crate::error::DomainError;
use crate::models::{
    Booking, BookingAuditEntry, BookingStatus, NewAuditEntry, OrganizerBookingItem,
};
use crate::store::{BookingStore, StoreTx};

/// Result of an organizer transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionOutcome {
    pub booking: Booking,
    pub to: BookingStatus,
    /// Rows changed by the guarded update (0 when a concurrent transition won)
    pub updated: u64,
}

/// Organizer actions on pending bookings.
///
/// Callers must have verified that the acting organizer owns the booking's
/// event before calling in.
pub struct ApprovalWorkflow<'a, S: BookingStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: BookingStore + ?Sized> ApprovalWorkflow<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Moves a pending booking to `paid` if firm (paid-only) capacity allows.
    #[instrument(skip(self))]
    pub async fn approve(
        &self,
        booking_id: i64,
        actor_id: i64,
    ) -> Result<TransitionOutcome, DomainError> {
        let mut tx = self.store.begin().await?;
        let booking = load_pending(tx.as_mut(), booking_id).await?;

        // A booking whose event vanished has nothing left to draw from.
        let free = match tx.event_capacity(booking.event_id).await? {
            Some(event) => {
                capacity::measure(tx.as_mut(), &event, CapacityBasis::Approval)
                    .await?
                    .free()
            }
            None => 0,
        };
        if free < i64::from(booking.qty) {
            debug!(booking_id, qty = booking.qty, free, "Approval rejected: no capacity");
            return Err(DomainError::NoCapacity { free });
        }

        finish(tx, booking, BookingStatus::Paid, actor_id).await
    }

    /// Moves a pending booking to `rejected`. No capacity check.
    #[instrument(skip(self))]
    pub async fn reject(
        &self,
        booking_id: i64,
        actor_id: i64,
    ) -> Result<TransitionOutcome, DomainError> {
        let mut tx = self.store.begin().await?;
        let booking = load_pending(tx.as_mut(), booking_id).await?;
        finish(tx, booking, BookingStatus::Rejected, actor_id).await
    }

    /// Bookings in `status` on the organizer's events, newest first.
    pub async fn list_by_status(
        &self,
        organizer_id: i64,
        status: BookingStatus,
    ) -> Result<Vec<OrganizerBookingItem>, DomainError> {
        Ok(self.store.list_for_organizer(organizer_id, status).await?)
    }

    /// The booking's audit trail, oldest first.
    pub async fn audit_trail(
        &self,
        booking_id: i64,
    ) -> Result<Vec<BookingAuditEntry>, DomainError> {
        Ok(self.store.audit_trail(booking_id).await?)
    }
}

async fn load_pending(tx: &mut dyn StoreTx, booking_id: i64) -> Result<Booking, DomainError> {
    let booking = tx
        .find_booking(booking_id)
        .await?
        .ok_or(DomainError::NotFound("booking"))?;
    if booking.status != BookingStatus::Pending {
        return Err(DomainError::NotPending);
    }
    Ok(booking)
}

async fn finish(
    mut tx: Box<dyn StoreTx>,
    booking: Booking,
    to: BookingStatus,
    actor_id: i64,
) -> Result<TransitionOutcome, DomainError> {
    let updated = tx
        .transition(booking.id, BookingStatus::Pending, to)
        .await?;

    if updated == 1 {
        tx.append_audit(NewAuditEntry {
            booking_id: booking.id,
            old_status: BookingStatus::Pending,
            new_status: to,
            actor_id: Some(actor_id),
        })
        .await?;
    }

    tx.commit().await?;

    if updated == 1 {
        counter!("bookings_transitions_total", "to" => to.as_str()).increment(1);
        info!(
            booking_id = booking.id,
            event_id = booking.event_id,
            actor_id,
            to = %to,
            "Booking transitioned"
        );
    } else {
        warn!(
            booking_id = booking.id,
            to = %to,
            "Booking changed concurrently, transition not applied"
        );
    }

    Ok(TransitionOutcome {
        booking,
        to,
        updated,
    })
}
