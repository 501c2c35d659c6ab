//! Event entities (database row mappings).

use chrono::{DateTime, Utc};
use domain::models::{Event, EventCapacity, EventListing, OrganizerEventItem};
use domain::services::CapacitySnapshot;
use sqlx::FromRow;

/// Database row mapping for the events table, with its category links.
#[derive(Debug, Clone, FromRow)]
pub struct EventEntity {
    pub id: i64,
    pub organizer_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub price_in_cents: i64,
    pub capacity: i32,
    pub category_ids: Vec<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<EventEntity> for Event {
    fn from(entity: EventEntity) -> Self {
        Self {
            id: entity.id,
            organizer_id: entity.organizer_id,
            title: entity.title,
            description: entity.description,
            location: entity.location,
            start_date: entity.start_date,
            end_date: entity.end_date,
            price_in_cents: entity.price_in_cents,
            capacity: entity.capacity,
            category_ids: entity.category_ids,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// Capacity columns of an event row.
#[derive(Debug, Clone, FromRow)]
pub struct EventCapacityEntity {
    pub event_id: i64,
    pub organizer_id: i64,
    pub capacity: i32,
}

impl From<EventCapacityEntity> for EventCapacity {
    fn from(entity: EventCapacityEntity) -> Self {
        Self {
            event_id: entity.event_id,
            organizer_id: entity.organizer_id,
            capacity: entity.capacity,
        }
    }
}

/// Search listing row with paid usage and viewer flags.
#[derive(Debug, Clone, FromRow)]
pub struct EventListingEntity {
    pub id: i64,
    pub title: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub location: Option<String>,
    pub price_in_cents: i64,
    pub capacity: i32,
    pub booked: i64,
    pub my_paid: bool,
    pub already_booked: bool,
}

impl From<EventListingEntity> for EventListing {
    fn from(entity: EventListingEntity) -> Self {
        let free = CapacitySnapshot::new(i64::from(entity.capacity), entity.booked).free();
        Self {
            id: entity.id,
            title: entity.title,
            start_date: entity.start_date,
            end_date: entity.end_date,
            location: entity.location,
            price_in_cents: entity.price_in_cents,
            capacity: entity.capacity,
            booked: entity.booked,
            free,
            my_paid: entity.my_paid,
            already_booked: entity.already_booked,
        }
    }
}

/// Organizer dashboard row.
#[derive(Debug, Clone, FromRow)]
pub struct OrganizerEventEntity {
    pub id: i64,
    pub title: String,
    pub start_date: DateTime<Utc>,
    pub location: Option<String>,
    pub capacity: i32,
}

impl From<OrganizerEventEntity> for OrganizerEventItem {
    fn from(entity: OrganizerEventEntity) -> Self {
        Self {
            id: entity.id,
            title: entity.title,
            start_date: entity.start_date,
            location: entity.location,
            capacity: entity.capacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(capacity: i32, booked: i64) -> EventListingEntity {
        EventListingEntity {
            id: 1,
            title: "Gig".to_string(),
            start_date: Utc::now(),
            end_date: Utc::now(),
            location: None,
            price_in_cents: 0,
            capacity,
            booked,
            my_paid: false,
            already_booked: false,
        }
    }

    #[test]
    fn test_listing_free_is_derived() {
        let listing: EventListing = listing(10, 4).into();
        assert_eq!(listing.free, 6);
    }

    #[test]
    fn test_listing_free_never_negative() {
        let listing: EventListing = listing(3, 5).into();
        assert_eq!(listing.free, 0);
        assert_eq!(listing.booked, 5);
    }
}
