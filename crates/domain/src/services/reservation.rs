//! Booking reservation engine.
//!
//! Reserve runs as one transaction with the event row locked from the
//! capacity read through the insert, so concurrent reservations against the
//! same event are serialized and pending+paid never exceeds capacity.

use metrics::counter;
use tracing::{debug, info, instrument};

use super::capacity::{self, CapacityBasis};
use crate::error::{DomainError, StoreError};
use crate::models::Booking;
use crate::store::BookingStore;

/// Creates and cancels pending reservations.
pub struct ReservationEngine<'a, S: BookingStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: BookingStore + ?Sized> ReservationEngine<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Reserves `qty` units of the event for the user as a pending booking.
    ///
    /// Checks run in order: quantity, event existence, free capacity over
    /// pending+paid, then the one-active-booking rule.
    #[instrument(skip(self))]
    pub async fn reserve(
        &self,
        event_id: i64,
        user_id: i64,
        qty: i64,
    ) -> Result<Booking, DomainError> {
        let qty = validate_quantity(qty)?;

        let mut tx = self.store.begin().await?;

        let event = tx
            .lock_event(event_id)
            .await?
            .ok_or(DomainError::NotFound("event"))?;

        let snapshot = capacity::measure(tx.as_mut(), &event, CapacityBasis::Reservation).await?;
        if !snapshot.can_fit(i64::from(qty)) {
            debug!(
                event_id,
                qty,
                free = snapshot.free(),
                "Reservation rejected: insufficient capacity"
            );
            return Err(DomainError::InsufficientCapacity {
                free: snapshot.free(),
            });
        }

        if tx.has_active_booking(event_id, user_id).await? {
            return Err(DomainError::DuplicateActiveBooking);
        }

        let booking = tx
            .insert_booking(event_id, user_id, qty)
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => DomainError::DuplicateActiveBooking,
                other => other.into(),
            })?;

        tx.commit().await?;

        counter!("bookings_reserved_total").increment(1);
        info!(
            booking_id = booking.id,
            event_id,
            user_id,
            qty,
            "Booking reserved"
        );

        Ok(booking)
    }

    /// Cancels the user's own pending booking for the event.
    ///
    /// Returns the ids of the cancelled bookings. Fails with
    /// [`DomainError::NothingToCancel`] when there is no pending booking,
    /// whether it was never made, already cancelled or already paid.
    #[instrument(skip(self))]
    pub async fn cancel(&self, event_id: i64, user_id: i64) -> Result<Vec<i64>, DomainError> {
        let mut tx = self.store.begin().await?;

        let cancelled = tx.cancel_pending(event_id, user_id).await?;
        if cancelled.is_empty() {
            return Err(DomainError::NothingToCancel);
        }

        tx.commit().await?;

        info!(event_id, user_id, count = cancelled.len(), "Booking cancelled");
        Ok(cancelled)
    }
}

/// Accepts positive quantities that fit the stored column.
fn validate_quantity(qty: i64) -> Result<i32, DomainError> {
    if qty <= 0 {
        return Err(DomainError::InvalidInput("qty must be positive".to_string()));
    }
    i32::try_from(qty).map_err(|_| DomainError::InvalidInput("qty is too large".to_string()))
}
