//! Repository implementations for database operations.

pub mod booking;
pub mod event;
pub mod review;
pub mod user;

pub use booking::BookingRepository;
pub use event::EventRepository;
pub use review::ReviewRepository;
pub use user::UserRepository;
