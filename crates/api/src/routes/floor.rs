use axum::routing::{get, post};
use axum::Router;

use crate::handlers::floor;
use crate::state::AppState;

/// Floor-plan routes.
///
/// ```text
/// POST   /redistribute     -> redistribute
/// GET    /spacing          -> spacing
/// POST   /align            -> align
/// POST   /fix-dimensions   -> fix_dimensions
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/redistribute", post(floor::redistribute))
        .route("/spacing", get(floor::spacing))
        .route("/align", post(floor::align))
        .route("/fix-dimensions", post(floor::fix_dimensions))
}
