use axum::routing::post;
use axum::Router;

use crate::handlers::availability;
use crate::state::AppState;

/// Availability routes.
///
/// ```text
/// POST   /tables     -> find_tables
/// POST   /slots      -> day_slots
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tables", post(availability::find_tables))
        .route("/slots", post(availability::day_slots))
}
