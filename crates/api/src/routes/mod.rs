pub mod availability;
pub mod floor;
pub mod health;
pub mod occupancy;
pub mod reservations;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /availability/tables              ranked table candidates (POST)
/// /availability/slots               per-slot load for a day (POST)
///
/// /reservations                     commit a booking (POST)
/// /reservations/{id}/status         status transition (PATCH)
/// /admin/reservations               staff booking, confirmed (POST)
///
/// /occupancy                        daily occupancy report (GET)
///
/// /floor/redistribute               uniform row spacing (POST)
/// /floor/spacing                    fitting spacing for a zone (GET)
/// /floor/align                      row and grid alignment (POST)
/// /floor/fix-dimensions             standard table sizes (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/availability", availability::router())
        .nest("/reservations", reservations::router())
        .nest("/admin/reservations", reservations::admin_router())
        .nest("/occupancy", occupancy::router())
        .nest("/floor", floor::router())
}
