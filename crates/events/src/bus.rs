//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is shared via `Arc<EventBus>` across request handlers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tablebook_core::types::DbId;
use tokio::sync::broadcast;

pub const RESERVATION_CREATED: &str = "reservation.created";
pub const RESERVATION_STATUS_CHANGED: &str = "reservation.status_changed";
pub const FLOOR_REDISTRIBUTED: &str = "floor.redistributed";

// ---------------------------------------------------------------------------
// BookingEvent
// ---------------------------------------------------------------------------

/// Something that happened to a reservation or the floor plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingEvent {
    /// Dot-separated event name, e.g. `"reservation.created"`.
    pub event_type: String,

    /// Reservation the event is about, if any.
    pub reservation_id: Option<DbId>,

    pub payload: serde_json::Value,

    pub timestamp: DateTime<Utc>,
}

impl BookingEvent {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            reservation_id: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    pub fn with_reservation(mut self, reservation_id: DbId) -> Self {
        self.reservation_id = Some(reservation_id);
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

const DEFAULT_CAPACITY: usize = 256;

/// In-process fan-out event bus.
///
/// When the buffer is full the oldest unread events are dropped and slow
/// receivers observe `RecvError::Lagged`.
pub struct EventBus {
    sender: broadcast::Sender<BookingEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish to all current subscribers. Dropped silently when nobody
    /// is listening.
    pub fn publish(&self, event: BookingEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BookingEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscriber_receives_reservation_event() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.publish(
            BookingEvent::new(RESERVATION_CREATED)
                .with_reservation(42)
                .with_payload(serde_json::json!({"party_size": 4})),
        );

        let received = rx.recv().await.expect("should receive the event");
        assert_eq!(received.event_type, RESERVATION_CREATED);
        assert_eq!(received.reservation_id, Some(42));
        assert_eq!(received.payload["party_size"], 4);
    }

    #[tokio::test]
    async fn every_subscriber_gets_a_copy() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(BookingEvent::new(FLOOR_REDISTRIBUTED));

        assert_eq!(rx1.recv().await.unwrap().event_type, FLOOR_REDISTRIBUTED);
        assert_eq!(rx2.recv().await.unwrap().event_type, FLOOR_REDISTRIBUTED);
    }

    #[test]
    fn publish_without_subscribers_is_a_no_op() {
        let bus = EventBus::default();
        bus.publish(BookingEvent::new("orphan.event"));
    }

    #[test]
    fn bare_event_has_empty_payload() {
        let event = BookingEvent::new(RESERVATION_STATUS_CHANGED);
        assert!(event.reservation_id.is_none());
        assert!(event.payload.is_object());
    }
}
