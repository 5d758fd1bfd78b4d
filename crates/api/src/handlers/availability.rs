//! Handlers for availability search.
//!
//! A search that finds nothing is a successful answer (200 with a negative
//! outcome); only invalid input or an unreachable store are errors.

use axum::extract::State;
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;

use tablebook_core::availability::{AvailabilityOutcome, AvailabilityQuery};
use tablebook_core::booking::{self, DayAvailability};

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// Body of `POST /availability/slots`.
#[derive(Debug, Deserialize)]
pub struct SlotQuery {
    pub date: NaiveDate,
    pub party_size: i32,
}

/// POST /availability/tables
///
/// Rank table assignments for a party at one date and time.
pub async fn find_tables(
    State(state): State<AppState>,
    Json(query): Json<AvailabilityQuery>,
) -> AppResult<Json<DataResponse<AvailabilityOutcome>>> {
    let outcome =
        booking::find_available_tables(state.store.as_ref(), &state.config.booking, &query).await?;
    Ok(Json(DataResponse { data: outcome }))
}

/// POST /availability/slots
///
/// Every bookable slot of the day with its load against the sitting ceiling.
pub async fn day_slots(
    State(state): State<AppState>,
    Json(query): Json<SlotQuery>,
) -> AppResult<Json<DataResponse<DayAvailability>>> {
    let overview = booking::slot_overview(state.store.as_ref(), query.date, query.party_size).await?;
    Ok(Json(DataResponse { data: overview }))
}
