use std::sync::Arc;

use tablebook_core::store::ReservationStore;
use tablebook_events::EventBus;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone; everything sits behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Tables, reservations and service configuration. Postgres in
    /// production, in-memory in router tests.
    pub store: Arc<dyn ReservationStore>,
    /// Server configuration, including the booking policy.
    pub config: Arc<ServerConfig>,
    /// Booking events for the notification relay.
    pub event_bus: Arc<EventBus>,
}
