//! [`domain::store::TicketStore`] implementations.

pub mod memory;
pub mod pg;

pub use memory::{MemoryStoreTx, MemoryTicketStore};
pub use pg::{PgStoreTx, PgTicketStore};
