//! Handlers for committing reservations and changing their status.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{NaiveDate, NaiveTime, Utc};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use tablebook_core::booking::{self, BookingConfirmation, BookingRequest, StatusChange};
use tablebook_core::reservation::{ConsentFlags, ReservationOrigin, ReservationStatus};
use tablebook_core::types::DbId;
use tablebook_events::bus::{RESERVATION_CREATED, RESERVATION_STATUS_CHANGED};
use tablebook_events::BookingEvent;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// Inbound reservation payload. The origin is not part of it; each route
/// fixes its own.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateReservation {
    #[validate(length(min = 1, max = 200))]
    pub customer_name: String,
    #[validate(email)]
    pub customer_email: String,
    #[validate(length(min = 6, max = 32))]
    pub customer_phone: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    #[validate(range(min = 1, max = 100))]
    pub party_size: i32,
    /// Explicit tables; omitted means "assign the best candidate".
    #[serde(default)]
    pub table_ids: Option<Vec<DbId>>,
    #[serde(default)]
    pub zone: Option<String>,
    #[serde(default)]
    pub consent: ConsentFlags,
    #[serde(default)]
    #[validate(length(max = 1000))]
    pub special_requests: Option<String>,
}

impl CreateReservation {
    fn into_request(self, origin: ReservationOrigin) -> BookingRequest {
        BookingRequest {
            customer_name: self.customer_name.trim().to_string(),
            customer_email: self.customer_email.trim().to_lowercase(),
            customer_phone: self.customer_phone.trim().to_string(),
            date: self.date,
            time: self.time,
            party_size: self.party_size,
            table_ids: self.table_ids,
            zone: self.zone,
            origin,
            consent: self.consent,
            special_requests: self.special_requests,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateReservationStatus {
    pub status: String,
}

// ---------------------------------------------------------------------------
// POST /reservations
// ---------------------------------------------------------------------------

/// Commit a public reservation. Answers 409 when the tables or the slot
/// were taken since the availability search.
pub async fn create_reservation(
    State(state): State<AppState>,
    Json(input): Json<CreateReservation>,
) -> AppResult<(StatusCode, Json<DataResponse<BookingConfirmation>>)> {
    commit(state, input, ReservationOrigin::Public).await
}

// ---------------------------------------------------------------------------
// POST /admin/reservations
// ---------------------------------------------------------------------------

/// Commit a staff reservation: confirmed on creation and not bound by the
/// per-slot ceiling.
pub async fn create_admin_reservation(
    State(state): State<AppState>,
    Json(input): Json<CreateReservation>,
) -> AppResult<(StatusCode, Json<DataResponse<BookingConfirmation>>)> {
    commit(state, input, ReservationOrigin::Admin).await
}

async fn commit(
    state: AppState,
    input: CreateReservation,
    origin: ReservationOrigin,
) -> AppResult<(StatusCode, Json<DataResponse<BookingConfirmation>>)> {
    input.validate()?;

    let request = input.into_request(origin);
    let customer_name = request.customer_name.clone();
    let customer_email = request.customer_email.clone();

    let confirmation =
        booking::assign_tables(state.store.as_ref(), &state.config.booking, request, Utc::now())
            .await?;

    let event = BookingEvent::new(RESERVATION_CREATED)
        .with_reservation(confirmation.reservation_id)
        .with_payload(json!({
            "customer_name": customer_name,
            "customer_email": customer_email,
            "origin": origin.as_str(),
            "date": confirmation.date,
            "time": confirmation.time,
            "party_size": confirmation.party_size,
            "table_ids": confirmation.table_ids,
            "status": confirmation.status.as_str(),
        }));
    state.event_bus.publish(event);

    Ok((StatusCode::CREATED, Json(DataResponse { data: confirmation })))
}

// ---------------------------------------------------------------------------
// PATCH /reservations/{id}/status
// ---------------------------------------------------------------------------

pub async fn update_reservation_status(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateReservationStatus>,
) -> AppResult<Json<DataResponse<StatusChange>>> {
    let to = ReservationStatus::parse(&input.status)?;
    let change = booking::update_status(state.store.as_ref(), id, to).await?;

    let event = BookingEvent::new(RESERVATION_STATUS_CHANGED)
        .with_reservation(id)
        .with_payload(json!({
            "from": change.from.as_str(),
            "to": change.to.as_str(),
        }));
    state.event_bus.publish(event);

    Ok(Json(DataResponse { data: change }))
}
