//! Publishes Postgres pool occupancy and flags saturation.

use sqlx::PgPool;
use tracing::warn;

use super::scheduler::{Job, JobFrequency};

/// Only registered for the postgres backend.
pub struct PoolMetricsJob {
    pool: PgPool,
    max_connections: u32,
}

impl PoolMetricsJob {
    pub fn new(pool: PgPool, max_connections: u32) -> Self {
        Self {
            pool,
            max_connections,
        }
    }
}

#[async_trait::async_trait]
impl Job for PoolMetricsJob {
    fn name(&self) -> &'static str {
        "pool_metrics"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Seconds(10)
    }

    async fn execute(&self) -> Result<(), String> {
        let snapshot = persistence::metrics::record_pool_metrics(&self.pool);
        if snapshot.is_saturated(self.max_connections) {
            // Reservations queue behind the acquire timeout and start
            // failing with retry_later.
            warn!(
                active = snapshot.active,
                max_connections = self.max_connections,
                "Database pool saturated"
            );
        }
        Ok(())
    }
}
