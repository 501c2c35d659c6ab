//! Store, transaction and identity seams.
//!
//! Every component receives its store explicitly. A [`StoreTx`] is one atomic
//! unit of work: dropping it without calling [`StoreTx::commit`] rolls back
//! everything it did.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::models::{
    Booking, BookingAuditEntry, BookingStatus, Event, EventCapacity, EventFilter, EventListing,
    EventPatch, MyBookingItem, NewAuditEntry, NewEvent, OrganizerBookingItem, OrganizerEventItem,
    Review,
};

/// Operations available inside one transaction.
#[async_trait]
pub trait StoreTx: Send {
    /// Reads the event's capacity and takes an exclusive row lock held until
    /// commit or rollback. Waiting is bounded; expiry yields
    /// [`StoreError::LockTimeout`].
    async fn lock_event(&mut self, event_id: i64) -> Result<Option<EventCapacity>, StoreError>;

    /// Reads the event's capacity without locking it.
    async fn event_capacity(&mut self, event_id: i64)
        -> Result<Option<EventCapacity>, StoreError>;

    /// Reads the event's `(start_date, end_date)` as seen by this transaction.
    async fn event_schedule(
        &mut self,
        event_id: i64,
    ) -> Result<Option<(DateTime<Utc>, DateTime<Utc>)>, StoreError>;

    /// Sum of `qty` over the event's bookings whose status is in `statuses`.
    async fn booked_quantity(
        &mut self,
        event_id: i64,
        statuses: &[BookingStatus],
    ) -> Result<i64, StoreError>;

    /// Whether the user holds a pending or paid booking for the event.
    async fn has_active_booking(&mut self, event_id: i64, user_id: i64)
        -> Result<bool, StoreError>;

    /// Inserts a new `pending` booking.
    async fn insert_booking(
        &mut self,
        event_id: i64,
        user_id: i64,
        qty: i32,
    ) -> Result<Booking, StoreError>;

    async fn find_booking(&mut self, booking_id: i64) -> Result<Option<Booking>, StoreError>;

    /// Moves the user's pending bookings for the event to `cancelled`.
    /// Returns the ids of the bookings that changed.
    async fn cancel_pending(&mut self, event_id: i64, user_id: i64)
        -> Result<Vec<i64>, StoreError>;

    /// Sets `to` only if the booking is still in `from`. Returns affected rows.
    async fn transition(
        &mut self,
        booking_id: i64,
        from: BookingStatus,
        to: BookingStatus,
    ) -> Result<u64, StoreError>;

    async fn append_audit(&mut self, entry: NewAuditEntry) -> Result<(), StoreError>;

    async fn update_event(&mut self, event_id: i64, patch: &EventPatch) -> Result<u64, StoreError>;

    /// Deletes the event together with its bookings, audit entries and reviews.
    async fn delete_event(&mut self, event_id: i64) -> Result<u64, StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}

/// Booking persistence: transactional writes plus read-side listings.
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, StoreError>;

    /// Bookings with `status` on events owned by the organizer, newest first.
    async fn list_for_organizer(
        &self,
        organizer_id: i64,
        status: BookingStatus,
    ) -> Result<Vec<OrganizerBookingItem>, StoreError>;

    /// The user's bookings with their review, ordered by event start.
    async fn list_for_user(&self, user_id: i64) -> Result<Vec<MyBookingItem>, StoreError>;

    /// Audit entries for a booking, oldest first.
    async fn audit_trail(&self, booking_id: i64) -> Result<Vec<BookingAuditEntry>, StoreError>;
}

/// Event catalog persistence.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Events matching the filter ordered by start date. Viewer-specific
    /// flags are computed when `viewer` is set.
    async fn search_events(
        &self,
        filter: &EventFilter,
        viewer: Option<i64>,
    ) -> Result<Vec<EventListing>, StoreError>;

    async fn get_event(&self, event_id: i64) -> Result<Option<Event>, StoreError>;

    /// Inserts the event and its category links. Returns the new id.
    async fn create_event(&self, organizer_id: i64, event: &NewEvent) -> Result<i64, StoreError>;

    /// The organizer's events, newest start first.
    async fn list_organizer_events(
        &self,
        organizer_id: i64,
    ) -> Result<Vec<OrganizerEventItem>, StoreError>;
}

/// Review persistence keyed by (user, event).
#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Inserts or replaces the review. Unknown events yield
    /// [`StoreError::MissingReference`].
    async fn upsert_review(
        &self,
        user_id: i64,
        event_id: i64,
        rating: i32,
        comment: &str,
    ) -> Result<Review, StoreError>;
}

/// Identity and ownership lookups.
#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    async fn is_organizer(&self, user_id: i64) -> Result<bool, StoreError>;

    /// Organizer owning the event, if the event exists.
    async fn event_owner(&self, event_id: i64) -> Result<Option<i64>, StoreError>;

    /// Organizer owning the booking's event, if the booking exists.
    async fn booking_owner(&self, booking_id: i64) -> Result<Option<i64>, StoreError>;
}

/// Everything the HTTP surface needs from a backing store.
#[async_trait]
pub trait TicketStore: BookingStore + CatalogStore + ReviewStore + IdentityDirectory {
    /// Round-trips to the backing store.
    async fn ping(&self) -> Result<(), StoreError>;
}
