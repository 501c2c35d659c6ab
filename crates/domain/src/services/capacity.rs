//! Capacity ledger.
//!
//! Free capacity is derived, never stored. Reservations measure against
//! pending and paid units so pending requests soft-hold capacity; approvals
//! measure against paid units only.

use crate::error::StoreError;
use crate::models::{BookingStatus, EventCapacity};
use crate::store::StoreTx;

/// Which bookings count as consuming capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityBasis {
    /// Pending and paid bookings.
    Reservation,
    /// Paid bookings only.
    Approval,
}

impl CapacityBasis {
    pub fn counted_statuses(self) -> &'static [BookingStatus] {
        match self {
            CapacityBasis::Reservation => &BookingStatus::ACTIVE,
            CapacityBasis::Approval => &[BookingStatus::Paid],
        }
    }
}

/// Point-in-time capacity usage of one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacitySnapshot {
    pub capacity: i64,
    pub booked: i64,
}

impl CapacitySnapshot {
    pub fn new(capacity: i64, booked: i64) -> Self {
        Self { capacity, booked }
    }

    /// Remaining units, never negative.
    pub fn free(&self) -> i64 {
        (self.capacity - self.booked).max(0)
    }

    pub fn can_fit(&self, qty: i64) -> bool {
        self.free() >= qty
    }
}

/// Measures an event's usage inside the caller's transaction.
pub async fn measure(
    tx: &mut dyn StoreTx,
    event: &EventCapacity,
    basis: CapacityBasis,
) -> Result<CapacitySnapshot, StoreError> {
    let booked = tx
        .booked_quantity(event.event_id, basis.counted_statuses())
        .await?;
    Ok(CapacitySnapshot::new(i64::from(event.capacity), booked))
}
