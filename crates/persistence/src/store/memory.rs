//! In-process ticket store.
//!
//! All state sits behind one async mutex. A transaction holds the mutex for
//! its whole lifetime and works on a staged copy that replaces the shared
//! state on commit, so every transaction is serializable and a dropped
//! transaction leaves no trace. Reservations on unrelated events also wait
//! on each other, which confines this store to tests and local development.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::models::{
    Booking, BookingAuditEntry, BookingStatus, Event, EventCapacity, EventFilter, EventListing,
    EventPatch, MyBookingItem, NewAuditEntry, NewEvent, OrganizerBookingItem, OrganizerEventItem,
    Review,
};
use domain::services::CapacitySnapshot;
use domain::store::{
    BookingStore, CatalogStore, IdentityDirectory, ReviewStore, StoreTx, TicketStore,
};
use domain::StoreError;
use tokio::sync::{Mutex, MutexGuard, OwnedMutexGuard};

/// Default bound on waiting for the store lock.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
struct UserRecord {
    email: String,
    full_name: Option<String>,
}

#[derive(Debug, Clone, Default)]
struct MemoryState {
    users: BTreeMap<i64, UserRecord>,
    organizers: BTreeSet<i64>,
    categories: BTreeMap<i64, String>,
    events: BTreeMap<i64, Event>,
    bookings: BTreeMap<i64, Booking>,
    audit: Vec<BookingAuditEntry>,
    reviews: BTreeMap<(i64, i64), Review>,
    next_id: i64,
}

impl MemoryState {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn capacity_of(&self, event_id: i64) -> Option<EventCapacity> {
        self.events.get(&event_id).map(|event| EventCapacity {
            event_id: event.id,
            organizer_id: event.organizer_id,
            capacity: event.capacity,
        })
    }

    fn booked(&self, event_id: i64, statuses: &[BookingStatus]) -> i64 {
        self.bookings
            .values()
            .filter(|b| b.event_id == event_id && statuses.contains(&b.status))
            .map(|b| i64::from(b.qty))
            .sum()
    }

    fn holds(&self, event_id: i64, user_id: i64, statuses: &[BookingStatus]) -> bool {
        self.bookings.values().any(|b| {
            b.event_id == event_id && b.user_id == user_id && statuses.contains(&b.status)
        })
    }
}

/// Single-process [`TicketStore`] for tests and development runs.
#[derive(Clone)]
pub struct MemoryTicketStore {
    state: Arc<Mutex<MemoryState>>,
    lock_timeout: Duration,
}

impl Default for MemoryTicketStore {
    fn default() -> Self {
        Self::new(DEFAULT_LOCK_TIMEOUT)
    }
}

impl MemoryTicketStore {
    /// Creates an empty store. `lock_timeout` bounds how long `begin` waits
    /// for a concurrent transaction to finish.
    pub fn new(lock_timeout: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState::default())),
            lock_timeout,
        }
    }

    async fn read(&self) -> Result<MutexGuard<'_, MemoryState>, StoreError> {
        tokio::time::timeout(self.lock_timeout, self.state.lock())
            .await
            .map_err(|_| StoreError::LockTimeout)
    }

    /// Adds a user account and returns its id.
    pub async fn add_user(
        &self,
        email: &str,
        full_name: Option<&str>,
    ) -> Result<i64, StoreError> {
        let mut state = self.read().await?;
        if state.users.values().any(|u| u.email == email) {
            return Err(StoreError::Conflict(format!("email {} already registered", email)));
        }
        let id = state.allocate_id();
        state.users.insert(
            id,
            UserRecord {
                email: email.to_string(),
                full_name: full_name.map(str::to_string),
            },
        );
        Ok(id)
    }

    /// Adds a user account with an organizer profile and returns its id.
    pub async fn add_organizer(
        &self,
        email: &str,
        full_name: Option<&str>,
    ) -> Result<i64, StoreError> {
        let id = self.add_user(email, full_name).await?;
        self.read().await?.organizers.insert(id);
        Ok(id)
    }

    /// Adds an event category and returns its id.
    pub async fn add_category(&self, name: &str) -> Result<i64, StoreError> {
        let mut state = self.read().await?;
        let id = state.allocate_id();
        state.categories.insert(id, name.to_string());
        Ok(id)
    }
}

/// Transaction over the in-memory state.
pub struct MemoryStoreTx {
    guard: OwnedMutexGuard<MemoryState>,
    staged: MemoryState,
}

#[async_trait]
impl StoreTx for MemoryStoreTx {
    async fn lock_event(&mut self, event_id: i64) -> Result<Option<EventCapacity>, StoreError> {
        // The whole store is already held exclusively.
        Ok(self.staged.capacity_of(event_id))
    }

    async fn event_capacity(
        &mut self,
        event_id: i64,
    ) -> Result<Option<EventCapacity>, StoreError> {
        Ok(self.staged.capacity_of(event_id))
    }

    async fn event_schedule(
        &mut self,
        event_id: i64,
    ) -> Result<Option<(DateTime<Utc>, DateTime<Utc>)>, StoreError> {
        Ok(self
            .staged
            .events
            .get(&event_id)
            .map(|event| (event.start_date, event.end_date)))
    }

    async fn booked_quantity(
        &mut self,
        event_id: i64,
        statuses: &[BookingStatus],
    ) -> Result<i64, StoreError> {
        Ok(self.staged.booked(event_id, statuses))
    }

    async fn has_active_booking(
        &mut self,
        event_id: i64,
        user_id: i64,
    ) -> Result<bool, StoreError> {
        Ok(self.staged.holds(event_id, user_id, &BookingStatus::ACTIVE))
    }

    async fn insert_booking(
        &mut self,
        event_id: i64,
        user_id: i64,
        qty: i32,
    ) -> Result<Booking, StoreError> {
        if !self.staged.events.contains_key(&event_id) {
            return Err(StoreError::MissingReference(format!("event {}", event_id)));
        }
        if !self.staged.users.contains_key(&user_id) {
            return Err(StoreError::MissingReference(format!("user {}", user_id)));
        }
        if self.staged.holds(event_id, user_id, &BookingStatus::ACTIVE) {
            return Err(StoreError::Conflict(format!(
                "active booking exists for event {} and user {}",
                event_id, user_id
            )));
        }

        let booking = Booking {
            id: self.staged.allocate_id(),
            event_id,
            user_id,
            qty,
            status: BookingStatus::Pending,
            created_at: Utc::now(),
        };
        self.staged.bookings.insert(booking.id, booking.clone());
        Ok(booking)
    }

    async fn find_booking(&mut self, booking_id: i64) -> Result<Option<Booking>, StoreError> {
        Ok(self.staged.bookings.get(&booking_id).cloned())
    }

    async fn cancel_pending(
        &mut self,
        event_id: i64,
        user_id: i64,
    ) -> Result<Vec<i64>, StoreError> {
        let mut cancelled = Vec::new();
        for booking in self.staged.bookings.values_mut() {
            if booking.event_id == event_id
                && booking.user_id == user_id
                && booking.status == BookingStatus::Pending
            {
                booking.status = BookingStatus::Cancelled;
                cancelled.push(booking.id);
            }
        }
        Ok(cancelled)
    }

    async fn transition(
        &mut self,
        booking_id: i64,
        from: BookingStatus,
        to: BookingStatus,
    ) -> Result<u64, StoreError> {
        match self.staged.bookings.get_mut(&booking_id) {
            Some(booking) if booking.status == from => {
                booking.status = to;
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    async fn append_audit(&mut self, entry: NewAuditEntry) -> Result<(), StoreError> {
        if !self.staged.bookings.contains_key(&entry.booking_id) {
            return Err(StoreError::MissingReference(format!(
                "booking {}",
                entry.booking_id
            )));
        }
        let id = self.staged.allocate_id();
        self.staged.audit.push(BookingAuditEntry {
            id,
            booking_id: entry.booking_id,
            old_status: entry.old_status,
            new_status: entry.new_status,
            actor_id: entry.actor_id,
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn update_event(&mut self, event_id: i64, patch: &EventPatch) -> Result<u64, StoreError> {
        match self.staged.events.get_mut(&event_id) {
            Some(event) => {
                patch.apply_to(event);
                event.updated_at = Utc::now();
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_event(&mut self, event_id: i64) -> Result<u64, StoreError> {
        let state = &mut self.staged;
        if state.events.remove(&event_id).is_none() {
            return Ok(0);
        }
        let removed: BTreeSet<i64> = state
            .bookings
            .values()
            .filter(|b| b.event_id == event_id)
            .map(|b| b.id)
            .collect();
        state.bookings.retain(|id, _| !removed.contains(id));
        state.audit.retain(|entry| !removed.contains(&entry.booking_id));
        state.reviews.retain(|(_, review_event), _| *review_event != event_id);
        Ok(1)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let MemoryStoreTx { mut guard, staged } = *self;
        *guard = staged;
        Ok(())
    }
}

#[async_trait]
impl BookingStore for MemoryTicketStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, StoreError> {
        let guard = tokio::time::timeout(self.lock_timeout, self.state.clone().lock_owned())
            .await
            .map_err(|_| StoreError::LockTimeout)?;
        let staged = guard.clone();
        Ok(Box::new(MemoryStoreTx { guard, staged }))
    }

    async fn list_for_organizer(
        &self,
        organizer_id: i64,
        status: BookingStatus,
    ) -> Result<Vec<OrganizerBookingItem>, StoreError> {
        let state = self.read().await?;
        let mut items: Vec<OrganizerBookingItem> = state
            .bookings
            .values()
            .filter(|b| b.status == status)
            .filter_map(|b| {
                let event = state.events.get(&b.event_id)?;
                if event.organizer_id != organizer_id {
                    return None;
                }
                let user = state.users.get(&b.user_id)?;
                Some(OrganizerBookingItem {
                    booking_id: b.id,
                    event_id: b.event_id,
                    event_title: event.title.clone(),
                    user_id: b.user_id,
                    user_name: user.full_name.clone(),
                    user_email: user.email.clone(),
                    qty: b.qty,
                    status: b.status,
                    created_at: b.created_at,
                })
            })
            .collect();
        items.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then(b.booking_id.cmp(&a.booking_id))
        });
        Ok(items)
    }

    async fn list_for_user(&self, user_id: i64) -> Result<Vec<MyBookingItem>, StoreError> {
        let state = self.read().await?;
        let mut items: Vec<MyBookingItem> = state
            .bookings
            .values()
            .filter(|b| b.user_id == user_id)
            .filter_map(|b| {
                let event = state.events.get(&b.event_id)?;
                let review = state.reviews.get(&(user_id, b.event_id));
                Some(MyBookingItem {
                    booking_id: b.id,
                    event_id: event.id,
                    title: event.title.clone(),
                    start_date: event.start_date,
                    location: event.location.clone(),
                    status: b.status,
                    qty: b.qty,
                    my_rating: review.map(|r| r.rating),
                    my_comment: review.map(|r| r.comment.clone()),
                })
            })
            .collect();
        items.sort_by(|a, b| {
            a.start_date
                .cmp(&b.start_date)
                .then(a.booking_id.cmp(&b.booking_id))
        });
        Ok(items)
    }

    async fn audit_trail(&self, booking_id: i64) -> Result<Vec<BookingAuditEntry>, StoreError> {
        let state = self.read().await?;
        Ok(state
            .audit
            .iter()
            .filter(|entry| entry.booking_id == booking_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CatalogStore for MemoryTicketStore {
    async fn search_events(
        &self,
        filter: &EventFilter,
        viewer: Option<i64>,
    ) -> Result<Vec<EventListing>, StoreError> {
        let state = self.read().await?;
        let mut listings: Vec<EventListing> = state
            .events
            .values()
            .filter(|event| filter.matches(event))
            .map(|event| {
                let booked = state.booked(event.id, &[BookingStatus::Paid]);
                let snapshot = CapacitySnapshot::new(i64::from(event.capacity), booked);
                let (my_paid, already_booked) = match viewer {
                    Some(user_id) => (
                        state.holds(event.id, user_id, &[BookingStatus::Paid]),
                        state.holds(event.id, user_id, &BookingStatus::ACTIVE),
                    ),
                    None => (false, false),
                };
                EventListing {
                    id: event.id,
                    title: event.title.clone(),
                    start_date: event.start_date,
                    end_date: event.end_date,
                    location: event.location.clone(),
                    price_in_cents: event.price_in_cents,
                    capacity: event.capacity,
                    booked,
                    free: snapshot.free(),
                    my_paid,
                    already_booked,
                }
            })
            .collect();
        listings.sort_by(|a, b| a.start_date.cmp(&b.start_date).then(a.id.cmp(&b.id)));
        Ok(listings)
    }

    async fn get_event(&self, event_id: i64) -> Result<Option<Event>, StoreError> {
        Ok(self.read().await?.events.get(&event_id).cloned())
    }

    async fn create_event(&self, organizer_id: i64, event: &NewEvent) -> Result<i64, StoreError> {
        let mut state = self.read().await?;
        if !state.users.contains_key(&organizer_id) {
            return Err(StoreError::MissingReference(format!(
                "user {}",
                organizer_id
            )));
        }
        if let Some(missing) = event
            .category_ids
            .iter()
            .find(|id| !state.categories.contains_key(id))
        {
            return Err(StoreError::MissingReference(format!("category {}", missing)));
        }

        let mut category_ids = event.category_ids.clone();
        category_ids.sort_unstable();
        category_ids.dedup();

        let id = state.allocate_id();
        let now = Utc::now();
        state.events.insert(
            id,
            Event {
                id,
                organizer_id,
                title: event.title.clone(),
                description: event.description.clone(),
                location: event.location.clone(),
                start_date: event.start_date,
                end_date: event.end_date,
                price_in_cents: event.price_in_cents,
                capacity: event.capacity,
                category_ids,
                created_at: now,
                updated_at: now,
            },
        );
        Ok(id)
    }

    async fn list_organizer_events(
        &self,
        organizer_id: i64,
    ) -> Result<Vec<OrganizerEventItem>, StoreError> {
        let state = self.read().await?;
        let mut items: Vec<OrganizerEventItem> = state
            .events
            .values()
            .filter(|event| event.organizer_id == organizer_id)
            .map(|event| OrganizerEventItem {
                id: event.id,
                title: event.title.clone(),
                start_date: event.start_date,
                location: event.location.clone(),
                capacity: event.capacity,
            })
            .collect();
        items.sort_by(|a, b| b.start_date.cmp(&a.start_date).then(b.id.cmp(&a.id)));
        Ok(items)
    }
}

#[async_trait]
impl ReviewStore for MemoryTicketStore {
    async fn upsert_review(
        &self,
        user_id: i64,
        event_id: i64,
        rating: i32,
        comment: &str,
    ) -> Result<Review, StoreError> {
        let mut state = self.read().await?;
        if !state.events.contains_key(&event_id) {
            return Err(StoreError::MissingReference(format!("event {}", event_id)));
        }
        if !state.users.contains_key(&user_id) {
            return Err(StoreError::MissingReference(format!("user {}", user_id)));
        }
        let review = Review {
            user_id,
            event_id,
            rating,
            comment: comment.to_string(),
            created_at: Utc::now(),
        };
        state.reviews.insert((user_id, event_id), review.clone());
        Ok(review)
    }
}

#[async_trait]
impl IdentityDirectory for MemoryTicketStore {
    async fn is_organizer(&self, user_id: i64) -> Result<bool, StoreError> {
        Ok(self.read().await?.organizers.contains(&user_id))
    }

    async fn event_owner(&self, event_id: i64) -> Result<Option<i64>, StoreError> {
        Ok(self
            .read()
            .await?
            .events
            .get(&event_id)
            .map(|event| event.organizer_id))
    }

    async fn booking_owner(&self, booking_id: i64) -> Result<Option<i64>, StoreError> {
        let state = self.read().await?;
        Ok(state
            .bookings
            .get(&booking_id)
            .and_then(|b| state.events.get(&b.event_id))
            .map(|event| event.organizer_id))
    }
}

#[async_trait]
impl TicketStore for MemoryTicketStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.read().await.map(|_| ())
    }
}
