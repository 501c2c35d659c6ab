//! Event catalog domain models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use shared::validation::{validate_not_blank, validate_schedule, MAX_TITLE_LENGTH};
use validator::{Validate, ValidationError};

use crate::error::DomainError;

/// Represents an event published by an organizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Event {
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

/// The slice of an event the capacity ledger needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventCapacity {
    pub event_id: i64,
    pub organizer_id: i64,
    pub capacity: i32,
}

/// Event row in the public search listing.
///
/// `booked` counts paid units only; `my_paid` and `already_booked` are
/// false for anonymous viewers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct EventListing {
    pub id: i64,
    pub title: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub location: Option<String>,
    pub price_in_cents: i64,
    pub capacity: i32,
    pub booked: i64,
    pub free: i64,
    pub my_paid: bool,
    pub already_booked: bool,
}

/// Organizer's own event, for their dashboard listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct OrganizerEventItem {
    pub id: i64,
    pub title: String,
    pub start_date: DateTime<Utc>,
    pub location: Option<String>,
    pub capacity: i32,
}

fn validate_new_event_schedule(event: &NewEvent) -> Result<(), ValidationError> {
    validate_schedule(&event.start_date, &event.end_date)
}

/// Request to create a new event.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
#[validate(schema(function = "validate_new_event_schedule"))]
pub struct NewEvent {
    #[validate(
        custom(function = "validate_not_blank"),
        length(max = MAX_TITLE_LENGTH, message = "title must be at most 200 characters")
    )]
    pub title: String,

    pub description: Option<String>,

    pub location: Option<String>,

    pub start_date: DateTime<Utc>,

    pub end_date: DateTime<Utc>,

    /// Price in cents (default: 0)
    #[serde(default)]
    #[validate(range(min = 0, message = "price_in_cents must not be negative"))]
    pub price_in_cents: i64,

    /// Capacity in units (default: 0)
    #[serde(default)]
    #[validate(range(min = 0, message = "capacity must not be negative"))]
    pub capacity: i32,

    #[serde(default)]
    pub category_ids: Vec<i64>,
}

/// Response after creating an event.
#[derive(Debug, Clone, Serialize)]
pub struct CreateEventResponse {
    pub id: i64,
}

fn validate_patch(patch: &EventPatch) -> Result<(), ValidationError> {
    if let Some(title) = &patch.title {
        validate_not_blank(title)?;
    }
    match (&patch.start_date, &patch.end_date) {
        (Some(start), Some(end)) => validate_schedule(start, end),
        _ => Ok(()),
    }
}

/// Partial update of an event's mutable fields.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
#[validate(schema(function = "validate_patch"))]
pub struct EventPatch {
    #[validate(length(max = MAX_TITLE_LENGTH, message = "title must be at most 200 characters"))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    #[validate(range(min = 0, message = "price_in_cents must not be negative"))]
    pub price_in_cents: Option<i64>,
    #[validate(range(min = 0, message = "capacity must not be negative"))]
    pub capacity: Option<i32>,
}

impl EventPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.location.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
            && self.price_in_cents.is_none()
            && self.capacity.is_none()
    }

    /// Applies the patch to an event in place.
    pub fn apply_to(&self, event: &mut Event) {
        if let Some(title) = &self.title {
            event.title = title.clone();
        }
        if let Some(description) = &self.description {
            event.description = Some(description.clone());
        }
        if let Some(location) = &self.location {
            event.location = Some(location.clone());
        }
        if let Some(start_date) = self.start_date {
            event.start_date = start_date;
        }
        if let Some(end_date) = self.end_date {
            event.end_date = end_date;
        }
        if let Some(price) = self.price_in_cents {
            event.price_in_cents = price;
        }
        if let Some(capacity) = self.capacity {
            event.capacity = capacity;
        }
    }
}

/// Response after updating an event.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateEventResponse {
    pub updated: u64,
}

/// Response after deleting an event.
#[derive(Debug, Clone, Serialize)]
pub struct DeleteEventResponse {
    pub deleted: u64,
}

/// Raw search query parameters as received over HTTP.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventSearchQuery {
    pub q: Option<String>,
    pub location: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub category_id: Option<String>,
}

/// Parsed, normalized event search filter.
///
/// Also serves as the listing cache key, so two queries that mean the same
/// thing must produce equal filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct EventFilter {
    pub text: Option<String>,
    pub location: Option<String>,
    pub starts_from: Option<DateTime<Utc>>,
    pub ends_until: Option<DateTime<Utc>>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub category_id: Option<i64>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_date(field: &str, value: &str) -> Result<DateTime<Utc>, DomainError> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| DomainError::InvalidInput(format!("{} must be a date", field)))
}

fn parse_int(field: &str, value: &str) -> Result<i64, DomainError> {
    value
        .parse::<i64>()
        .map_err(|_| DomainError::InvalidInput(format!("{} must be an integer", field)))
}

impl TryFrom<&EventSearchQuery> for EventFilter {
    type Error = DomainError;

    fn try_from(query: &EventSearchQuery) -> Result<Self, Self::Error> {
        Ok(Self {
            text: non_empty(&query.q).map(str::to_lowercase),
            location: non_empty(&query.location).map(str::to_lowercase),
            starts_from: non_empty(&query.from)
                .map(|v| parse_date("from", v))
                .transpose()?,
            ends_until: non_empty(&query.to)
                .map(|v| parse_date("to", v))
                .transpose()?,
            min_price: non_empty(&query.min_price)
                .map(|v| parse_int("min_price", v))
                .transpose()?,
            max_price: non_empty(&query.max_price)
                .map(|v| parse_int("max_price", v))
                .transpose()?,
            category_id: non_empty(&query.category_id)
                .map(|v| parse_int("category_id", v))
                .transpose()?,
        })
    }
}

impl EventFilter {
    /// Evaluates the filter against an event in memory.
    pub fn matches(&self, event: &Event) -> bool {
        if let Some(text) = &self.text {
            let in_title = event.title.to_lowercase().contains(text);
            let in_description = event
                .description
                .as_deref()
                .map(|d| d.to_lowercase().contains(text))
                .unwrap_or(false);
            if !in_title && !in_description {
                return false;
            }
        }
        if let Some(location) = &self.location {
            let hit = event
                .location
                .as_deref()
                .map(|l| l.to_lowercase().contains(location))
                .unwrap_or(false);
            if !hit {
                return false;
            }
        }
        if self.starts_from.is_some_and(|from| event.start_date < from) {
            return false;
        }
        if self.ends_until.is_some_and(|to| event.end_date > to) {
            return false;
        }
        if self.min_price.is_some_and(|min| event.price_in_cents < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| event.price_in_cents > max) {
            return false;
        }
        if let Some(category_id) = self.category_id {
            if !event.category_ids.contains(&category_id) {
                return false;
            }
        }
        true
    }
}
