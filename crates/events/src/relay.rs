//! Hand-off to the external notification service.
//!
//! The relay subscribes to the bus and turns customer-facing events into
//! [`Notification`]s on an mpsc channel. Whatever owns the receiving end
//! (email or WhatsApp delivery) lives outside this workspace; without one
//! the relay only logs.

use serde::Serialize;
use tablebook_core::types::DbId;
use tokio::sync::{broadcast, mpsc};

use crate::bus::{BookingEvent, RESERVATION_CREATED, RESERVATION_STATUS_CHANGED};

/// A message the notification service should send.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub reservation_id: DbId,
    /// Template key, e.g. `"reservation_received"`.
    pub template: String,
    pub payload: serde_json::Value,
}

/// Map a bus event to the notification it triggers, if any.
pub fn notification_for(event: &BookingEvent) -> Option<Notification> {
    let reservation_id = event.reservation_id?;
    let template = match event.event_type.as_str() {
        RESERVATION_CREATED => "reservation_received".to_string(),
        RESERVATION_STATUS_CHANGED => match event.payload["to"].as_str()? {
            "confirmed" => "reservation_confirmed".to_string(),
            "cancelled" => "reservation_cancelled".to_string(),
            _ => return None,
        },
        _ => return None,
    };
    Some(Notification {
        reservation_id,
        template,
        payload: event.payload.clone(),
    })
}

/// Background subscriber forwarding notifications.
pub struct NotificationRelay;

impl NotificationRelay {
    /// Run until the bus is dropped.
    pub async fn run(
        mut receiver: broadcast::Receiver<BookingEvent>,
        outbox: Option<mpsc::Sender<Notification>>,
    ) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    let Some(notification) = notification_for(&event) else {
                        continue;
                    };
                    tracing::info!(
                        reservation_id = notification.reservation_id,
                        template = %notification.template,
                        "Notification queued",
                    );
                    if let Some(tx) = &outbox {
                        if tx.send(notification).await.is_err() {
                            tracing::warn!("Notification outbox closed, dropping message");
                        }
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Notification relay lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, notification relay shutting down");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{EventBus, FLOOR_REDISTRIBUTED};

    #[test]
    fn created_maps_to_received_template() {
        let event = BookingEvent::new(RESERVATION_CREATED).with_reservation(5);
        let n = notification_for(&event).unwrap();
        assert_eq!(n.template, "reservation_received");
        assert_eq!(n.reservation_id, 5);
    }

    #[test]
    fn only_customer_facing_status_changes_notify() {
        let confirmed = BookingEvent::new(RESERVATION_STATUS_CHANGED)
            .with_reservation(5)
            .with_payload(serde_json::json!({"from": "pending", "to": "confirmed"}));
        assert_eq!(
            notification_for(&confirmed).unwrap().template,
            "reservation_confirmed"
        );

        let seated = BookingEvent::new(RESERVATION_STATUS_CHANGED)
            .with_reservation(5)
            .with_payload(serde_json::json!({"from": "confirmed", "to": "seated"}));
        assert!(notification_for(&seated).is_none());
        assert!(notification_for(&BookingEvent::new(FLOOR_REDISTRIBUTED)).is_none());
    }

    #[tokio::test]
    async fn relay_forwards_and_stops_with_the_bus() {
        let bus = EventBus::default();
        let (tx, mut rx) = mpsc::channel(8);
        let handle = tokio::spawn(NotificationRelay::run(bus.subscribe(), Some(tx)));

        bus.publish(BookingEvent::new(FLOOR_REDISTRIBUTED));
        bus.publish(BookingEvent::new(RESERVATION_CREATED).with_reservation(9));

        let n = rx.recv().await.unwrap();
        assert_eq!(n.reservation_id, 9);

        drop(bus);
        handle.await.unwrap();
    }
}
