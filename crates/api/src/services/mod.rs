//! In-process services used by the HTTP layer.

pub mod event_cache;

pub use event_cache::EventListCache;
