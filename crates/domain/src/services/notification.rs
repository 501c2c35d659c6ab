//! Booking notification sink.
//!
//! Committed booking state changes are published here. Delivery is
//! fire-and-forget: a sink never fails the operation that produced the event.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{Booking, BookingStatus};

/// Kind of booking change being announced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingNotificationKind {
    Requested,
    Cancelled,
    Approved,
    Rejected,
}

impl std::fmt::Display for BookingNotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BookingNotificationKind::Requested => write!(f, "requested"),
            BookingNotificationKind::Cancelled => write!(f, "cancelled"),
            BookingNotificationKind::Approved => write!(f, "approved"),
            BookingNotificationKind::Rejected => write!(f, "rejected"),
        }
    }
}

/// Payload describing one committed booking change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct BookingNotification {
    pub kind: BookingNotificationKind,
    pub booking_id: i64,
    pub event_id: i64,
    pub user_id: i64,
    pub status: BookingStatus,
    /// Organizer who acted, for organizer-driven changes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<i64>,
    pub timestamp: DateTime<Utc>,
}

impl BookingNotification {
    /// Describes `booking` as it stands after the change.
    pub fn for_booking(
        kind: BookingNotificationKind,
        booking: &Booking,
        actor_id: Option<i64>,
    ) -> Self {
        Self {
            kind,
            booking_id: booking.id,
            event_id: booking.event_id,
            user_id: booking.user_id,
            status: booking.status,
            actor_id,
            timestamp: Utc::now(),
        }
    }
}

/// Sink for booking notifications.
#[async_trait::async_trait]
pub trait BookingNotifier: Send + Sync {
    async fn notify(&self, notification: BookingNotification);
}

/// Writes each notification as a structured log event.
#[derive(Debug, Clone, Default)]
pub struct TracingNotifier;

#[async_trait::async_trait]
impl BookingNotifier for TracingNotifier {
    async fn notify(&self, notification: BookingNotification) {
        tracing::info!(
            target: "booking_notifications",
            kind = %notification.kind,
            booking_id = notification.booking_id,
            event_id = notification.event_id,
            user_id = notification.user_id,
            status = %notification.status,
            actor_id = ?notification.actor_id,
            "Booking notification"
        );
    }
}

/// Keeps every notification in memory for inspection in tests.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<BookingNotification>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything received so far.
    pub fn sent(&self) -> Vec<BookingNotification> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl BookingNotifier for RecordingNotifier {
    async fn notify(&self, notification: BookingNotification) {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(notification);
        }
    }
}
