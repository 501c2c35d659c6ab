//! Store metrics: query latency, event lock waits and pool occupancy.

use metrics::{counter, gauge, histogram};
use sqlx::PgPool;
use std::time::{Duration, Instant};

pub fn record_query_duration(query_name: &str, duration_secs: f64) {
    histogram!(
        "database_query_duration_seconds",
        "query" => query_name.to_string()
    )
    .record(duration_secs);
}

/// How a wait for the event row lock ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockWait {
    Acquired,
    /// The event row does not exist, so nothing was locked.
    Missing,
    TimedOut,
    Failed,
}

impl LockWait {
    pub fn as_str(&self) -> &'static str {
        match self {
            LockWait::Acquired => "acquired",
            LockWait::Missing => "missing",
            LockWait::TimedOut => "timed_out",
            LockWait::Failed => "failed",
        }
    }
}

/// Records how long a transaction waited on an event row lock.
///
/// Timeouts are also counted separately so contention on hot events is
/// visible without histogram queries.
pub fn record_lock_wait(outcome: LockWait, waited: Duration) {
    histogram!("event_lock_wait_seconds", "outcome" => outcome.as_str())
        .record(waited.as_secs_f64());
    if outcome == LockWait::TimedOut {
        counter!("event_lock_timeouts_total").increment(1);
    }
}

/// Connection pool occupancy at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSnapshot {
    pub size: u32,
    pub idle: usize,
    pub active: usize,
}

impl PoolSnapshot {
    pub fn new(size: u32, idle: usize) -> Self {
        Self {
            size,
            idle,
            active: (size as usize).saturating_sub(idle),
        }
    }

    /// True when every allowed connection is checked out. New requests then
    /// wait for the acquire timeout and may fail as retryable.
    pub fn is_saturated(&self, max_connections: u32) -> bool {
        max_connections > 0 && self.active >= max_connections as usize
    }
}

/// Publishes pool gauges and returns what was published.
pub fn record_pool_metrics(pool: &PgPool) -> PoolSnapshot {
    let snapshot = PoolSnapshot::new(pool.size(), pool.num_idle());

    gauge!("database_connections_active").set(snapshot.active as f64);
    gauge!("database_connections_idle").set(snapshot.idle as f64);
    gauge!("database_connections_total").set(snapshot.size as f64);

    snapshot
}

/// Times one named query.
///
/// ```ignore
/// let timer = QueryTimer::new("find_booking_by_id");
/// let result = sqlx::query_as::<_, BookingEntity>(...).fetch_optional(&mut *tx).await;
/// timer.record();
/// ```
pub struct QueryTimer {
    query_name: &'static str,
    start: Instant,
}

impl QueryTimer {
    pub fn new(query_name: &'static str) -> Self {
        Self {
            query_name,
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn record(self) {
        record_query_duration(self.query_name, self.start.elapsed().as_secs_f64());
    }
}
