//! Persistence layer for the event ticketing backend.
//!
//! This crate contains:
//! - Database connection management and migrations
//! - Entity definitions (database row mappings)
//! - Repository implementations
//! - The PostgreSQL and in-memory ticket stores

pub mod db;
pub mod entities;
pub mod error;
pub mod metrics;
pub mod repositories;
pub mod store;

pub use store::{MemoryTicketStore, PgTicketStore};
