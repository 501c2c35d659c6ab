//! Best-effort cache for anonymous event listings.
//!
//! Entries are keyed by the normalized [`EventFilter`] and expire after a
//! fixed TTL. Any catalog write or booking change clears the whole cache and
//! bumps its generation; a listing read before that bump is never stored.
//! Capacity decisions never read from here.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use domain::models::{EventFilter, EventListing};
use metrics::counter;
use tracing::warn;

struct CachedListing {
    stored_at: Instant,
    items: Arc<Vec<EventListing>>,
}

/// TTL cache of search results. A zero TTL disables it.
pub struct EventListCache {
    ttl: Duration,
    entries: RwLock<HashMap<EventFilter, CachedListing>>,
    /// Bumped by every invalidation, under the write lock.
    generation: AtomicU64,
}

impl EventListCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
            generation: AtomicU64::new(0),
        }
    }

    /// Take this before reading the store and hand it back to [`Self::put`].
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    fn read_entries(&self) -> RwLockReadGuard<'_, HashMap<EventFilter, CachedListing>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// A panic while holding the lock leaves the map usable; clearing or
    /// pruning it is still correct, so writers carry on.
    fn write_entries(&self) -> RwLockWriteGuard<'_, HashMap<EventFilter, CachedListing>> {
        self.entries.write().unwrap_or_else(|poisoned| {
            warn!("Event list cache lock was poisoned; recovering");
            PoisonError::into_inner(poisoned)
        })
    }

    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    /// Returns a fresh entry for the filter, if any.
    pub fn get(&self, filter: &EventFilter) -> Option<Arc<Vec<EventListing>>> {
        if !self.is_enabled() {
            return None;
        }
        let entries = self.read_entries();
        let hit = entries
            .get(filter)
            .filter(|entry| entry.stored_at.elapsed() < self.ttl)
            .map(|entry| Arc::clone(&entry.items));

        let outcome = if hit.is_some() { "hit" } else { "miss" };
        counter!("event_list_cache_lookups_total", "outcome" => outcome).increment(1);
        hit
    }

    /// Stores `items` unless the cache was invalidated since `generation`
    /// was taken. Returns the items either way.
    pub fn put(
        &self,
        filter: EventFilter,
        items: Vec<EventListing>,
        generation: u64,
    ) -> Arc<Vec<EventListing>> {
        let items = Arc::new(items);
        if self.is_enabled() {
            let mut entries = self.write_entries();
            if self.generation.load(Ordering::Acquire) == generation {
                entries.insert(
                    filter,
                    CachedListing {
                        stored_at: Instant::now(),
                        items: Arc::clone(&items),
                    },
                );
            }
        }
        items
    }

    /// Drops every entry.
    pub fn invalidate(&self) {
        let mut entries = self.write_entries();
        self.generation.fetch_add(1, Ordering::AcqRel);
        entries.clear();
    }

    /// Drops expired entries. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let mut entries = self.write_entries();
        let before = entries.len();
        entries.retain(|_, entry| entry.stored_at.elapsed() < self.ttl);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.read_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for EventListCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventListCache")
            .field("ttl", &self.ttl)
            .field("entries", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(q: &str) -> EventFilter {
        EventFilter {
            text: Some(q.to_string()),
            ..EventFilter::default()
        }
    }

    #[test]
    fn test_put_then_get() {
        let cache = EventListCache::new(Duration::from_secs(30));
        cache.put(filter("jazz"), Vec::new(), cache.generation());

        assert!(cache.get(&filter("jazz")).is_some());
        assert!(cache.get(&filter("rock")).is_none());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_invalidate_clears_everything() {
        let cache = EventListCache::new(Duration::from_secs(30));
        cache.put(filter("jazz"), Vec::new(), cache.generation());
        cache.put(EventFilter::default(), Vec::new(), cache.generation());

        cache.invalidate();
        assert!(cache.is_empty());
        assert!(cache.get(&EventFilter::default()).is_none());
    }

    #[test]
    fn test_zero_ttl_disables_cache() {
        let cache = EventListCache::new(Duration::ZERO);
        cache.put(filter("jazz"), Vec::new(), cache.generation());

        assert!(!cache.is_enabled());
        assert!(cache.get(&filter("jazz")).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_expired_entries_are_ignored_and_swept() {
        let cache = EventListCache::new(Duration::from_millis(20));
        cache.put(filter("jazz"), Vec::new(), cache.generation());
        std::thread::sleep(Duration::from_millis(40));

        assert!(cache.get(&filter("jazz")).is_none());
        assert_eq!(cache.sweep(), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_listing_read_before_invalidation_is_not_stored() {
        let cache = EventListCache::new(Duration::from_secs(30));
        let seen = cache.generation();

        // A write lands between the store read and the put.
        cache.invalidate();
        let items = cache.put(filter("jazz"), Vec::new(), seen);

        assert!(items.is_empty());
        assert!(cache.get(&filter("jazz")).is_none());
        assert!(cache.is_empty());

        cache.put(filter("jazz"), Vec::new(), cache.generation());
        assert!(cache.get(&filter("jazz")).is_some());
    }

    #[test]
    fn test_poisoned_lock_still_invalidates() {
        let cache = Arc::new(EventListCache::new(Duration::from_secs(30)));
        cache.put(filter("jazz"), Vec::new(), cache.generation());

        let poisoner = Arc::clone(&cache);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.entries.write().unwrap();
            panic!("poison the cache lock");
        })
        .join();
        assert!(cache.entries.is_poisoned());
        assert_eq!(cache.len(), 1);

        cache.invalidate();
        assert_eq!(cache.len(), 0);
    }
}
