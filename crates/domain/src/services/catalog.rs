//! Event catalog service.
//!
//! Writes that affect capacity (update, delete) take the event row lock so
//! they serialize with reservations on the same event.

use tracing::{info, instrument};
use validator::Validate;

use super::capacity::{self, CapacityBasis};
use crate::error::{DomainError, StoreError};
use crate::models::event::EventSearchQuery;
use crate::models::{Event, EventFilter, EventListing, EventPatch, NewEvent, OrganizerEventItem};
use crate::store::{BookingStore, CatalogStore};

pub struct EventCatalog<'a, S: BookingStore + CatalogStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: BookingStore + CatalogStore + ?Sized> EventCatalog<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub async fn search(
        &self,
        query: &EventSearchQuery,
        viewer: Option<i64>,
    ) -> Result<Vec<EventListing>, DomainError> {
        let filter = EventFilter::try_from(query)?;
        self.search_filtered(&filter, viewer).await
    }

    pub async fn search_filtered(
        &self,
        filter: &EventFilter,
        viewer: Option<i64>,
    ) -> Result<Vec<EventListing>, DomainError> {
        Ok(self.store.search_events(filter, viewer).await?)
    }

    pub async fn get(&self, event_id: i64) -> Result<Event, DomainError> {
        self.store
            .get_event(event_id)
            .await?
            .ok_or(DomainError::NotFound("event"))
    }

    #[instrument(skip(self, event), fields(title = %event.title))]
    pub async fn create(&self, organizer_id: i64, event: &NewEvent) -> Result<i64, DomainError> {
        event.validate()?;
        let id = self
            .store
            .create_event(organizer_id, event)
            .await
            .map_err(|e| match e {
                StoreError::MissingReference(what) => {
                    DomainError::InvalidInput(format!("unknown reference: {}", what))
                }
                other => other.into(),
            })?;
        info!(event_id = id, organizer_id, "Event created");
        Ok(id)
    }

    /// Applies a partial update. Capacity may not drop below the units
    /// currently held by pending and paid bookings.
    #[instrument(skip(self, patch))]
    pub async fn update(&self, event_id: i64, patch: &EventPatch) -> Result<u64, DomainError> {
        if patch.is_empty() {
            return Err(DomainError::InvalidInput("no fields".to_string()));
        }
        patch.validate()?;

        let mut tx = self.store.begin().await?;
        let event = tx
            .lock_event(event_id)
            .await?
            .ok_or(DomainError::NotFound("event"))?;

        // A single new date must fit the window as it stands under the lock.
        if patch.start_date.is_some() != patch.end_date.is_some() {
            let (current_start, current_end) = tx
                .event_schedule(event_id)
                .await?
                .ok_or(DomainError::NotFound("event"))?;
            let start = patch.start_date.unwrap_or(current_start);
            let end = patch.end_date.unwrap_or(current_end);
            if end < start {
                return Err(DomainError::InvalidInput(
                    "end_date must not be before start_date".to_string(),
                ));
            }
        }

        if let Some(new_capacity) = patch.capacity {
            let snapshot =
                capacity::measure(tx.as_mut(), &event, CapacityBasis::Reservation).await?;
            if i64::from(new_capacity) < snapshot.booked {
                return Err(DomainError::CapacityBelowBooked {
                    booked: snapshot.booked,
                });
            }
        }

        let updated = tx.update_event(event_id, patch).await?;
        tx.commit().await?;

        info!(event_id, updated, "Event updated");
        Ok(updated)
    }

    /// Deletes the event with its bookings, audit trail and reviews.
    #[instrument(skip(self))]
    pub async fn delete(&self, event_id: i64) -> Result<u64, DomainError> {
        let mut tx = self.store.begin().await?;
        if tx.lock_event(event_id).await?.is_none() {
            return Err(DomainError::NotFound("event"));
        }
        let deleted = tx.delete_event(event_id).await?;
        tx.commit().await?;

        info!(event_id, "Event deleted");
        Ok(deleted)
    }

    pub async fn organizer_events(
        &self,
        organizer_id: i64,
    ) -> Result<Vec<OrganizerEventItem>, DomainError> {
        Ok(self.store.list_organizer_events(organizer_id).await?)
    }
}
