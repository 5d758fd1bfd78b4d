//! Booking event bus.
//!
//! - [`EventBus`] is an in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`BookingEvent`] is the event envelope handed to subscribers.
//! - [`NotificationRelay`] is the background subscriber that forwards
//!   customer-facing events to the notification service.

pub mod bus;
pub mod relay;

pub use bus::{BookingEvent, EventBus};
pub use relay::NotificationRelay;
