//! Event repository for catalog queries.

use domain::models::{EventFilter, NewEvent};
use sqlx::PgPool;

use crate::entities::{EventEntity, EventListingEntity, OrganizerEventEntity};
use crate::metrics::QueryTimer;

/// Builds an `ILIKE ... ESCAPE '\'` pattern matching `needle` as a plain
/// substring, so `%`, `_` and `\` in search input match themselves.
pub fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Repository for event catalog database operations.
#[derive(Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    /// Creates a new EventRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Search events. `booked` counts paid units; viewer flags are false when
    /// `viewer` is `None`.
    pub async fn search(
        &self,
        filter: &EventFilter,
        viewer: Option<i64>,
    ) -> Result<Vec<EventListingEntity>, sqlx::Error> {
        let timer = QueryTimer::new("search_events");
        let result = sqlx::query_as::<_, EventListingEntity>(
            r#"
            SELECT e.id, e.title, e.start_date, e.end_date, e.location,
                   e.price_in_cents, e.capacity,
                   (SELECT COALESCE(SUM(b.qty), 0)
                      FROM bookings b
                     WHERE b.event_id = e.id AND b.status = 'paid')::BIGINT AS booked,
                   EXISTS(SELECT 1 FROM bookings b
                           WHERE b.event_id = e.id AND b.user_id = $8
                             AND b.status = 'paid') AS my_paid,
                   EXISTS(SELECT 1 FROM bookings b
                           WHERE b.event_id = e.id AND b.user_id = $8
                             AND b.status IN ('pending', 'paid')) AS already_booked
            FROM events e
            WHERE ($1::text IS NULL
                   OR e.title ILIKE $1 ESCAPE '\'
                   OR e.description ILIKE $1 ESCAPE '\')
              AND ($2::text IS NULL OR e.location ILIKE $2 ESCAPE '\')
              AND ($3::timestamptz IS NULL OR e.start_date >= $3)
              AND ($4::timestamptz IS NULL OR e.end_date <= $4)
              AND ($5::bigint IS NULL OR e.price_in_cents >= $5)
              AND ($6::bigint IS NULL OR e.price_in_cents <= $6)
              AND ($7::bigint IS NULL OR EXISTS(
                    SELECT 1 FROM event_categories ec
                     WHERE ec.event_id = e.id AND ec.category_id = $7))
            ORDER BY e.start_date ASC, e.id ASC
            "#,
        )
        .bind(filter.text.as_deref().map(contains_pattern))
        .bind(filter.location.as_deref().map(contains_pattern))
        .bind(filter.starts_from)
        .bind(filter.ends_until)
        .bind(filter.min_price)
        .bind(filter.max_price)
        .bind(filter.category_id)
        .bind(viewer)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find an event by ID, with its category ids.
    pub async fn find_by_id(&self, id: i64) -> Result<Option<EventEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_event_by_id");
        let result = sqlx::query_as::<_, EventEntity>(
            r#"
            SELECT e.id, e.organizer_id, e.title, e.description, e.location,
                   e.start_date, e.end_date, e.price_in_cents, e.capacity,
                   ARRAY(SELECT ec.category_id FROM event_categories ec
                          WHERE ec.event_id = e.id
                          ORDER BY ec.category_id) AS category_ids,
                   e.created_at, e.updated_at
            FROM events e
            WHERE e.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Create an event and link its categories in one transaction.
    pub async fn create(&self, organizer_id: i64, event: &NewEvent) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("create_event");
        let mut tx = self.pool.begin().await?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO events (organizer_id, title, description, location,
                                start_date, end_date, price_in_cents, capacity)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(organizer_id)
        .bind(&event.title)
        .bind(event.description.as_deref())
        .bind(event.location.as_deref())
        .bind(event.start_date)
        .bind(event.end_date)
        .bind(event.price_in_cents)
        .bind(event.capacity)
        .fetch_one(&mut *tx)
        .await?;

        if !event.category_ids.is_empty() {
            sqlx::query(
                r#"
                INSERT INTO event_categories (event_id, category_id)
                SELECT $1, UNNEST($2::bigint[])
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(id)
            .bind(&event.category_ids)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        timer.record();
        Ok(id)
    }

    /// The organizer's events, newest start first.
    pub async fn list_for_organizer(
        &self,
        organizer_id: i64,
    ) -> Result<Vec<OrganizerEventEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_events_for_organizer");
        let result = sqlx::query_as::<_, OrganizerEventEntity>(
            r#"
            SELECT id, title, start_date, location, capacity
            FROM events
            WHERE organizer_id = $1
            ORDER BY start_date DESC, id DESC
            "#,
        )
        .bind(organizer_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }
}
