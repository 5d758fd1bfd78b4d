use axum::extract::{Query, State};
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;

use tablebook_core::occupancy::{occupancy_for_range, OccupancyReport};

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct OccupancyParams {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// GET /occupancy?start_date&end_date
///
/// One sample per day of the inclusive range.
pub async fn occupancy_report(
    State(state): State<AppState>,
    Query(params): Query<OccupancyParams>,
) -> AppResult<Json<DataResponse<OccupancyReport>>> {
    let report =
        occupancy_for_range(state.store.as_ref(), params.start_date, params.end_date).await?;
    Ok(Json(DataResponse { data: report }))
}
