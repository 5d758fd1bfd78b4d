use axum::routing::get;
use axum::Router;

use crate::handlers::occupancy;
use crate::state::AppState;

/// `GET /?start_date=YYYY-MM-DD&end_date=YYYY-MM-DD -> occupancy_report`
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(occupancy::occupancy_report))
}
