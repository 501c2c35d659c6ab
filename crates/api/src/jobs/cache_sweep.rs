//! Evicts expired entries from the event listing cache.

use std::sync::Arc;

use tracing::debug;

use super::scheduler::{Job, JobFrequency};
use crate::services::EventListCache;

pub struct CacheSweepJob {
    cache: Arc<EventListCache>,
}

impl CacheSweepJob {
    pub fn new(cache: Arc<EventListCache>) -> Self {
        Self { cache }
    }
}

#[async_trait::async_trait]
impl Job for CacheSweepJob {
    fn name(&self) -> &'static str {
        "event_cache_sweep"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Minutes(1)
    }

    async fn execute(&self) -> Result<(), String> {
        let evicted = self.cache.sweep();
        metrics::gauge!("event_list_cache_entries").set(self.cache.len() as f64);
        debug!(evicted, "Event cache swept");
        Ok(())
    }
}
