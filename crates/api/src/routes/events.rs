//! Event catalog endpoint handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::event::{
    CreateEventResponse, DeleteEventResponse, EventSearchQuery, UpdateEventResponse,
};
use domain::models::{Event, EventFilter, EventListing, EventPatch, NewEvent, OrganizerEventItem};
use domain::services::EventCatalog;
use tracing::info;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{OptionalUserAuth, OrganizerAuth};

/// Search the catalog.
///
/// GET /api/event?q=&location=&from=&to=&min_price=&max_price=&category_id=
///
/// Anonymous results are served from the listing cache when fresh.
pub async fn search_events(
    State(state): State<AppState>,
    viewer: OptionalUserAuth,
    Query(query): Query<EventSearchQuery>,
) -> Result<Json<Vec<EventListing>>, ApiError> {
    let filter = EventFilter::try_from(&query)?;
    let catalog = EventCatalog::new(state.store.as_ref());

    if let Some(user) = viewer.0 {
        let items = catalog.search_filtered(&filter, Some(user.user_id)).await?;
        return Ok(Json(items));
    }

    if let Some(cached) = state.event_cache.get(&filter) {
        return Ok(Json(cached.as_ref().clone()));
    }

    let generation = state.event_cache.generation();
    let items = catalog.search_filtered(&filter, None).await?;
    let items = state.event_cache.put(filter, items, generation);
    Ok(Json(items.as_ref().clone()))
}

/// Get a single event.
///
/// GET /api/event/:event_id
pub async fn get_event(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
) -> Result<Json<Event>, ApiError> {
    let event = EventCatalog::new(state.store.as_ref()).get(event_id).await?;
    Ok(Json(event))
}

/// Create an event owned by the calling organizer.
///
/// POST /api/event
pub async fn create_event(
    State(state): State<AppState>,
    organizer: OrganizerAuth,
    Json(request): Json<NewEvent>,
) -> Result<(StatusCode, Json<CreateEventResponse>), ApiError> {
    let id = EventCatalog::new(state.store.as_ref())
        .create(organizer.organizer_id, &request)
        .await?;
    state.event_cache.invalidate();

    info!(event_id = id, organizer_id = organizer.organizer_id, "Event created");

    Ok((StatusCode::CREATED, Json(CreateEventResponse { id })))
}

/// Update the mutable fields of an event.
///
/// PUT /api/event/:event_id
pub async fn update_event(
    State(state): State<AppState>,
    organizer: OrganizerAuth,
    Path(event_id): Path<i64>,
    Json(patch): Json<EventPatch>,
) -> Result<Json<UpdateEventResponse>, ApiError> {
    organizer.ensure_owner(state.store.event_owner(event_id).await?, "event")?;

    let updated = EventCatalog::new(state.store.as_ref())
        .update(event_id, &patch)
        .await?;
    state.event_cache.invalidate();

    Ok(Json(UpdateEventResponse { updated }))
}

/// Delete an event together with its bookings and reviews.
///
/// DELETE /api/event/:event_id
pub async fn delete_event(
    State(state): State<AppState>,
    organizer: OrganizerAuth,
    Path(event_id): Path<i64>,
) -> Result<Json<DeleteEventResponse>, ApiError> {
    organizer.ensure_owner(state.store.event_owner(event_id).await?, "event")?;

    let deleted = EventCatalog::new(state.store.as_ref())
        .delete(event_id)
        .await?;
    state.event_cache.invalidate();

    info!(event_id, organizer_id = organizer.organizer_id, "Event deleted");

    Ok(Json(DeleteEventResponse { deleted }))
}

/// The calling organizer's events, newest start first.
///
/// GET /api/organizer/events
pub async fn list_organizer_events(
    State(state): State<AppState>,
    organizer: OrganizerAuth,
) -> Result<Json<Vec<OrganizerEventItem>>, ApiError> {
    let events = EventCatalog::new(state.store.as_ref())
        .organizer_events(organizer.organizer_id)
        .await?;
    Ok(Json(events))
}

/// One of the calling organizer's events.
///
/// GET /api/organizer/event/:event_id
pub async fn get_organizer_event(
    State(state): State<AppState>,
    organizer: OrganizerAuth,
    Path(event_id): Path<i64>,
) -> Result<Json<Event>, ApiError> {
    organizer.ensure_owner(state.store.event_owner(event_id).await?, "event")?;

    let event = EventCatalog::new(state.store.as_ref()).get(event_id).await?;
    Ok(Json(event))
}
