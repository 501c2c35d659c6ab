//! PostgreSQL-backed ticket store.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::models::{
    Booking, BookingAuditEntry, BookingStatus, Event, EventCapacity, EventFilter, EventListing,
    EventPatch, MyBookingItem, NewAuditEntry, NewEvent, OrganizerBookingItem, OrganizerEventItem,
    Review,
};
use domain::store::{
    BookingStore, CatalogStore, IdentityDirectory, ReviewStore, StoreTx, TicketStore,
};
use domain::StoreError;
use sqlx::{PgPool, Postgres, Transaction};

use crate::entities::{BookingEntity, BookingStatusDb, EventCapacityEntity};
use crate::error::store_error;
use crate::metrics::{record_lock_wait, LockWait, QueryTimer};
use crate::repositories::{BookingRepository, EventRepository, ReviewRepository, UserRepository};

/// Ticket store over a PostgreSQL pool.
#[derive(Clone)]
pub struct PgTicketStore {
    pool: PgPool,
    lock_timeout: Duration,
    bookings: BookingRepository,
    events: EventRepository,
    reviews: ReviewRepository,
    users: UserRepository,
}

impl PgTicketStore {
    /// Creates a store. `lock_timeout` bounds how long a transaction waits
    /// for an event row lock.
    pub fn new(pool: PgPool, lock_timeout: Duration) -> Self {
        Self {
            bookings: BookingRepository::new(pool.clone()),
            events: EventRepository::new(pool.clone()),
            reviews: ReviewRepository::new(pool.clone()),
            users: UserRepository::new(pool.clone()),
            pool,
            lock_timeout,
        }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// One database transaction. Dropping it without `commit` rolls back.
pub struct PgStoreTx {
    tx: Transaction<'static, Postgres>,
    lock_timeout: Duration,
}

impl PgStoreTx {
    async fn fetch_capacity(
        &mut self,
        event_id: i64,
        for_update: bool,
    ) -> Result<Option<EventCapacity>, StoreError> {
        let sql = if for_update {
            "SELECT id AS event_id, organizer_id, capacity FROM events WHERE id = $1 FOR UPDATE"
        } else {
            "SELECT id AS event_id, organizer_id, capacity FROM events WHERE id = $1"
        };
        let timer = QueryTimer::new(if for_update {
            "lock_event"
        } else {
            "find_event_capacity"
        });
        let result = sqlx::query_as::<_, EventCapacityEntity>(sql)
            .bind(event_id)
            .fetch_optional(&mut *self.tx)
            .await;
        timer.record();
        Ok(result.map_err(store_error)?.map(Into::into))
    }
}

#[async_trait]
impl StoreTx for PgStoreTx {
    async fn lock_event(&mut self, event_id: i64) -> Result<Option<EventCapacity>, StoreError> {
        // Scoped to this transaction only.
        sqlx::query("SELECT set_config('lock_timeout', $1, true)")
            .bind(format!("{}ms", self.lock_timeout.as_millis()))
            .execute(&mut *self.tx)
            .await
            .map_err(store_error)?;

        let started = Instant::now();
        let result = self.fetch_capacity(event_id, true).await;
        let outcome = match &result {
            Ok(Some(_)) => LockWait::Acquired,
            Ok(None) => LockWait::Missing,
            Err(StoreError::LockTimeout) => LockWait::TimedOut,
            Err(_) => LockWait::Failed,
        };
        record_lock_wait(outcome, started.elapsed());
        result
    }

    async fn event_capacity(
        &mut self,
        event_id: i64,
    ) -> Result<Option<EventCapacity>, StoreError> {
        self.fetch_capacity(event_id, false).await
    }

    async fn event_schedule(
        &mut self,
        event_id: i64,
    ) -> Result<Option<(DateTime<Utc>, DateTime<Utc>)>, StoreError> {
        let timer = QueryTimer::new("find_event_schedule");
        let result = sqlx::query_as::<_, (DateTime<Utc>, DateTime<Utc>)>(
            "SELECT start_date, end_date FROM events WHERE id = $1",
        )
        .bind(event_id)
        .fetch_optional(&mut *self.tx)
        .await;
        timer.record();
        result.map_err(store_error)
    }

    async fn booked_quantity(
        &mut self,
        event_id: i64,
        statuses: &[BookingStatus],
    ) -> Result<i64, StoreError> {
        let statuses: Vec<String> = statuses.iter().map(|s| s.as_str().to_string()).collect();
        let timer = QueryTimer::new("sum_booked_quantity");
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COALESCE(SUM(qty), 0)::BIGINT
            FROM bookings
            WHERE event_id = $1 AND status::text = ANY($2)
            "#,
        )
        .bind(event_id)
        .bind(&statuses)
        .fetch_one(&mut *self.tx)
        .await;
        timer.record();
        result.map_err(store_error)
    }

    async fn has_active_booking(
        &mut self,
        event_id: i64,
        user_id: i64,
    ) -> Result<bool, StoreError> {
        let timer = QueryTimer::new("has_active_booking");
        let result = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM bookings
                WHERE event_id = $1 AND user_id = $2 AND status IN ('pending', 'paid')
            )
            "#,
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_one(&mut *self.tx)
        .await;
        timer.record();
        result.map_err(store_error)
    }

    async fn insert_booking(
        &mut self,
        event_id: i64,
        user_id: i64,
        qty: i32,
    ) -> Result<Booking, StoreError> {
        let timer = QueryTimer::new("insert_booking");
        let result = sqlx::query_as::<_, BookingEntity>(
            r#"
            INSERT INTO bookings (event_id, user_id, qty, status)
            VALUES ($1, $2, $3, 'pending')
            RETURNING id, event_id, user_id, qty, status, created_at
            "#,
        )
        .bind(event_id)
        .bind(user_id)
        .bind(qty)
        .fetch_one(&mut *self.tx)
        .await;
        timer.record();
        Ok(result.map_err(store_error)?.into())
    }

    async fn find_booking(&mut self, booking_id: i64) -> Result<Option<Booking>, StoreError> {
        let timer = QueryTimer::new("find_booking_by_id");
        let result = sqlx::query_as::<_, BookingEntity>(
            r#"
            SELECT id, event_id, user_id, qty, status, created_at
            FROM bookings
            WHERE id = $1
            "#,
        )
        .bind(booking_id)
        .fetch_optional(&mut *self.tx)
        .await;
        timer.record();
        Ok(result.map_err(store_error)?.map(Into::into))
    }

    async fn cancel_pending(
        &mut self,
        event_id: i64,
        user_id: i64,
    ) -> Result<Vec<i64>, StoreError> {
        let timer = QueryTimer::new("cancel_pending_booking");
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE bookings
            SET status = 'cancelled'
            WHERE event_id = $1 AND user_id = $2 AND status = 'pending'
            RETURNING id
            "#,
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_all(&mut *self.tx)
        .await;
        timer.record();
        result.map_err(store_error)
    }

    async fn transition(
        &mut self,
        booking_id: i64,
        from: BookingStatus,
        to: BookingStatus,
    ) -> Result<u64, StoreError> {
        let timer = QueryTimer::new("transition_booking");
        let result = sqlx::query("UPDATE bookings SET status = $3 WHERE id = $1 AND status = $2")
            .bind(booking_id)
            .bind(BookingStatusDb::from(from))
            .bind(BookingStatusDb::from(to))
            .execute(&mut *self.tx)
            .await;
        timer.record();
        Ok(result.map_err(store_error)?.rows_affected())
    }

    async fn append_audit(&mut self, entry: NewAuditEntry) -> Result<(), StoreError> {
        let timer = QueryTimer::new("insert_booking_audit");
        let result = sqlx::query(
            r#"
            INSERT INTO booking_audit (booking_id, old_status, new_status, actor_id)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(entry.booking_id)
        .bind(BookingStatusDb::from(entry.old_status))
        .bind(BookingStatusDb::from(entry.new_status))
        .bind(entry.actor_id)
        .execute(&mut *self.tx)
        .await;
        timer.record();
        result.map(|_| ()).map_err(store_error)
    }

    async fn update_event(&mut self, event_id: i64, patch: &EventPatch) -> Result<u64, StoreError> {
        let timer = QueryTimer::new("update_event");
        let result = sqlx::query(
            r#"
            UPDATE events
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                location = COALESCE($4, location),
                start_date = COALESCE($5, start_date),
                end_date = COALESCE($6, end_date),
                price_in_cents = COALESCE($7, price_in_cents),
                capacity = COALESCE($8, capacity),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(event_id)
        .bind(patch.title.as_deref())
        .bind(patch.description.as_deref())
        .bind(patch.location.as_deref())
        .bind(patch.start_date)
        .bind(patch.end_date)
        .bind(patch.price_in_cents)
        .bind(patch.capacity)
        .execute(&mut *self.tx)
        .await;
        timer.record();
        Ok(result.map_err(store_error)?.rows_affected())
    }

    async fn delete_event(&mut self, event_id: i64) -> Result<u64, StoreError> {
        let timer = QueryTimer::new("delete_event");
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(event_id)
            .execute(&mut *self.tx)
            .await;
        timer.record();
        Ok(result.map_err(store_error)?.rows_affected())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await.map_err(store_error)
    }
}

#[async_trait]
impl BookingStore for PgTicketStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, StoreError> {
        let tx = self.pool.begin().await.map_err(store_error)?;
        Ok(Box::new(PgStoreTx {
            tx,
            lock_timeout: self.lock_timeout,
        }))
    }

    async fn list_for_organizer(
        &self,
        organizer_id: i64,
        status: BookingStatus,
    ) -> Result<Vec<OrganizerBookingItem>, StoreError> {
        let rows = self
            .bookings
            .list_for_organizer(organizer_id, status.into())
            .await
            .map_err(store_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_for_user(&self, user_id: i64) -> Result<Vec<MyBookingItem>, StoreError> {
        let rows = self
            .bookings
            .list_for_user(user_id)
            .await
            .map_err(store_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn audit_trail(&self, booking_id: i64) -> Result<Vec<BookingAuditEntry>, StoreError> {
        let rows = self
            .bookings
            .audit_trail(booking_id)
            .await
            .map_err(store_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl CatalogStore for PgTicketStore {
    async fn search_events(
        &self,
        filter: &EventFilter,
        viewer: Option<i64>,
    ) -> Result<Vec<EventListing>, StoreError> {
        let rows = self
            .events
            .search(filter, viewer)
            .await
            .map_err(store_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn get_event(&self, event_id: i64) -> Result<Option<Event>, StoreError> {
        let row = self
            .events
            .find_by_id(event_id)
            .await
            .map_err(store_error)?;
        Ok(row.map(Into::into))
    }

    async fn create_event(&self, organizer_id: i64, event: &NewEvent) -> Result<i64, StoreError> {
        self.events
            .create(organizer_id, event)
            .await
            .map_err(store_error)
    }

    async fn list_organizer_events(
        &self,
        organizer_id: i64,
    ) -> Result<Vec<OrganizerEventItem>, StoreError> {
        let rows = self
            .events
            .list_for_organizer(organizer_id)
            .await
            .map_err(store_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl ReviewStore for PgTicketStore {
    async fn upsert_review(
        &self,
        user_id: i64,
        event_id: i64,
        rating: i32,
        comment: &str,
    ) -> Result<Review, StoreError> {
        let row = self
            .reviews
            .upsert(user_id, event_id, rating, comment)
            .await
            .map_err(store_error)?;
        Ok(row.into())
    }
}

#[async_trait]
impl IdentityDirectory for PgTicketStore {
    async fn is_organizer(&self, user_id: i64) -> Result<bool, StoreError> {
        self.users.is_organizer(user_id).await.map_err(store_error)
    }

    async fn event_owner(&self, event_id: i64) -> Result<Option<i64>, StoreError> {
        self.users.event_owner(event_id).await.map_err(store_error)
    }

    async fn booking_owner(&self, booking_id: i64) -> Result<Option<i64>, StoreError> {
        self.users
            .booking_owner(booking_id)
            .await
            .map_err(store_error)
    }
}

#[async_trait]
impl TicketStore for PgTicketStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(store_error)
    }
}
