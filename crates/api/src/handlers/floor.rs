//! Handlers for floor-plan maintenance.
//!
//! Batch endpoints answer 200 even when some tables could not be written;
//! the `skipped` list in the body names them.

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

use tablebook_core::floor::{
    self, AlignmentChange, DimensionFix, FloorBatch, PositionChange, DEFAULT_MAX_WIDTH,
    DEFAULT_SPACING,
};
use tablebook_events::bus::FLOOR_REDISTRIBUTED;
use tablebook_events::BookingEvent;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct RedistributeFloor {
    /// Gap between neighbouring tables; defaults to [`DEFAULT_SPACING`].
    #[serde(default)]
    pub spacing: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct SpacingParams {
    pub zone: String,
    #[serde(default)]
    pub max_width: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct ZoneSpacing {
    pub zone: String,
    pub max_width: f64,
    pub spacing: f64,
}

/// POST /floor/redistribute
pub async fn redistribute(
    State(state): State<AppState>,
    Json(input): Json<RedistributeFloor>,
) -> AppResult<Json<DataResponse<FloorBatch<PositionChange>>>> {
    let spacing = input.spacing.unwrap_or(DEFAULT_SPACING);
    let batch = floor::redistribute_floor(state.store.as_ref(), spacing).await?;

    let event = BookingEvent::new(FLOOR_REDISTRIBUTED).with_payload(json!({
        "spacing": spacing,
        "updated": batch.applied.len(),
        "skipped": batch.skipped.len(),
    }));
    state.event_bus.publish(event);

    Ok(Json(DataResponse { data: batch }))
}

/// GET /floor/spacing?zone&max_width
pub async fn spacing(
    State(state): State<AppState>,
    Query(params): Query<SpacingParams>,
) -> AppResult<Json<DataResponse<ZoneSpacing>>> {
    let max_width = params.max_width.unwrap_or(DEFAULT_MAX_WIDTH);
    let spacing = floor::zone_spacing(state.store.as_ref(), &params.zone, max_width).await?;
    Ok(Json(DataResponse {
        data: ZoneSpacing {
            zone: params.zone,
            max_width,
            spacing,
        },
    }))
}

/// POST /floor/align
pub async fn align(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<FloorBatch<AlignmentChange>>>> {
    let batch = floor::align_floor(state.store.as_ref()).await?;
    Ok(Json(DataResponse { data: batch }))
}

/// POST /floor/fix-dimensions
pub async fn fix_dimensions(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<FloorBatch<DimensionFix>>>> {
    let batch = floor::fix_floor_dimensions(state.store.as_ref()).await?;
    Ok(Json(DataResponse { data: batch }))
}
