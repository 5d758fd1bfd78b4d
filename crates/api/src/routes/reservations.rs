use axum::routing::{patch, post};
use axum::Router;

use crate::handlers::reservations;
use crate::state::AppState;

/// Reservation routes.
///
/// ```text
/// POST   /               -> create_reservation
/// PATCH  /{id}/status    -> update_reservation_status
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(reservations::create_reservation))
        .route("/{id}/status", patch(reservations::update_reservation_status))
}

/// Staff reservation routes, mounted under `/admin/reservations`.
///
/// ```text
/// POST   /               -> create_admin_reservation
/// ```
pub fn admin_router() -> Router<AppState> {
    Router::new().route("/", post(reservations::create_admin_reservation))
}
