//! Store-driven booking operations: availability search, the guarded
//! commit, the per-slot overview and status changes.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveTime, Offset, Utc};
use serde::Serialize;

use crate::availability::{
    self, AvailabilityOutcome, AvailabilityQuery, SearchLimits, UnavailableReason,
    DEFAULT_MAX_CANDIDATES, DEFAULT_MAX_COMBINED_TABLES,
};
use crate::capacity::{
    plan_day, slot_availability, DayPlan, ServiceDayConfig, ServiceKind, SlotAvailability,
    TurnName,
};
use crate::error::CoreError;
use crate::reservation::{
    booked_in_slot, state_machine, ConsentFlags, NewReservation, ReservationOrigin,
    ReservationStatus, DEFAULT_TABLE_TURNOVER_MINUTES,
};
use crate::store::{CommitGuard, ReservationStore};
use crate::table::DiningTable;
use crate::types::DbId;

/// Default restaurant offset from UTC, in hours.
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = 2;

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// Tunables shared by every booking operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BookingPolicy {
    pub turnover_minutes: i64,
    pub max_combined_tables: usize,
    pub max_candidates: usize,
    /// When set, a manual table selection may hold at most
    /// `ceil(party_size * buffer)` seats.
    pub capacity_buffer: Option<f64>,
    /// Fixed offset of the restaurant clock. Does not follow DST.
    pub utc_offset: FixedOffset,
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            turnover_minutes: DEFAULT_TABLE_TURNOVER_MINUTES,
            max_combined_tables: DEFAULT_MAX_COMBINED_TABLES,
            max_candidates: DEFAULT_MAX_CANDIDATES,
            capacity_buffer: None,
            utc_offset: FixedOffset::east_opt(DEFAULT_UTC_OFFSET_HOURS * 3600)
                .unwrap_or_else(|| Utc.fix()),
        }
    }
}

impl BookingPolicy {
    pub fn limits(&self) -> SearchLimits {
        SearchLimits {
            turnover_minutes: self.turnover_minutes,
            max_combined_tables: self.max_combined_tables,
            max_candidates: self.max_candidates,
            enforce_slot_ceiling: true,
        }
    }

    /// Restaurant-local wall-clock time for an instant.
    pub fn local_now(&self, now: DateTime<Utc>) -> chrono::NaiveDateTime {
        now.with_timezone(&self.utc_offset).naive_local()
    }
}

pub fn utc_offset_hours(hours: i32) -> Result<FixedOffset, CoreError> {
    FixedOffset::east_opt(hours * 3600).ok_or_else(|| {
        CoreError::Validation(format!("UTC offset out of range: {hours} hours"))
    })
}

// ---------------------------------------------------------------------------
// Day plan and availability
// ---------------------------------------------------------------------------

/// Weekday index with Sunday as 0.
pub fn day_of_week(date: NaiveDate) -> u32 {
    date.weekday().num_days_from_sunday()
}

/// The stored configuration for the date's weekday, or the defaults.
pub async fn load_day_plan(
    store: &dyn ReservationStore,
    date: NaiveDate,
) -> Result<DayPlan, CoreError> {
    let dow = day_of_week(date);
    let config = match store.service_config(dow).await? {
        Some(config) => config,
        None => {
            tracing::debug!(day_of_week = dow, "No service configuration, using defaults");
            ServiceDayConfig::fallback(dow)
        }
    };
    plan_day(&config)
}

pub async fn find_available_tables(
    store: &dyn ReservationStore,
    policy: &BookingPolicy,
    query: &AvailabilityQuery,
) -> Result<AvailabilityOutcome, CoreError> {
    availability::validate_party_size(query.party_size)?;

    let tables = store.list_tables().await?;
    let reservations = store.list_reservations(query.date).await?;
    let plan = load_day_plan(store, query.date).await?;

    let outcome = availability::resolve(query, &tables, &reservations, &plan, &policy.limits())?;
    tracing::debug!(
        date = %query.date,
        time = %query.time,
        party_size = query.party_size,
        outcome = outcome_label(&outcome),
        "Availability resolved",
    );
    Ok(outcome)
}

fn outcome_label(outcome: &AvailabilityOutcome) -> &'static str {
    match outcome {
        AvailabilityOutcome::Available { .. } => "available",
        AvailabilityOutcome::NoAvailability { .. } => "no_availability",
        AvailabilityOutcome::ExceedsGroupableCapacity { .. } => "exceeds_groupable_capacity",
    }
}

// ---------------------------------------------------------------------------
// Slot overview
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnAvailability {
    pub name: TurnName,
    pub label: &'static str,
    pub per_slot_ceiling: i32,
    pub slots: Vec<SlotAvailability>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceAvailability {
    pub kind: ServiceKind,
    pub turns: Vec<TurnAvailability>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayAvailability {
    pub date: NaiveDate,
    pub day_of_week: u32,
    pub is_open: bool,
    pub target_capacity: i32,
    pub services: Vec<ServiceAvailability>,
}

/// Every bookable slot of the date with its load against the turn ceiling.
pub async fn slot_overview(
    store: &dyn ReservationStore,
    date: NaiveDate,
    party_size: i32,
) -> Result<DayAvailability, CoreError> {
    availability::validate_party_size(party_size)?;
    let plan = load_day_plan(store, date).await?;
    let reservations = store.list_reservations(date).await?;

    let services = plan
        .services
        .iter()
        .map(|service| ServiceAvailability {
            kind: service.kind,
            turns: service
                .turns
                .iter()
                .map(|turn| TurnAvailability {
                    name: turn.name,
                    label: turn.name.label(),
                    per_slot_ceiling: turn.per_slot_ceiling,
                    slots: turn
                        .slots
                        .iter()
                        .map(|&time| {
                            let booked = booked_in_slot(&reservations, date, time);
                            slot_availability(time, booked, turn.per_slot_ceiling, party_size)
                        })
                        .collect(),
                })
                .collect(),
        })
        .collect();

    Ok(DayAvailability {
        date,
        day_of_week: plan.day_of_week,
        is_open: plan.is_open,
        target_capacity: plan.target_capacity,
        services,
    })
}

// ---------------------------------------------------------------------------
// Commit
// ---------------------------------------------------------------------------

/// A booking to commit. Without `table_ids` the best-ranked candidate is
/// assigned.
///
/// `origin` is decided by the caller's entry point, never by the booking
/// payload. Admin bookings skip the consent and future-time checks and are
/// not bound by the per-slot ceiling, whether tables are picked by hand or
/// assigned. Table overlap is always enforced.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingRequest {
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub party_size: i32,
    pub table_ids: Option<Vec<DbId>>,
    pub zone: Option<String>,
    pub origin: ReservationOrigin,
    pub consent: ConsentFlags,
    pub special_requests: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookingConfirmation {
    pub reservation_id: DbId,
    pub status: ReservationStatus,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub party_size: i32,
    pub table_ids: Vec<DbId>,
}

/// Check a hand-picked table set against the party.
pub fn validate_selection(
    tables: &[DiningTable],
    selected: &[DbId],
    party_size: i32,
    capacity_buffer: Option<f64>,
) -> Result<(), CoreError> {
    if selected.is_empty() {
        return Err(CoreError::Validation("At least one table must be selected".into()));
    }
    let mut seen = std::collections::BTreeSet::new();
    let mut total = 0;
    for id in selected {
        if !seen.insert(*id) {
            return Err(CoreError::Validation(format!("Table {id} selected twice")));
        }
        let table = tables
            .iter()
            .find(|t| t.id == *id)
            .ok_or(CoreError::NotFound { entity: "table", id: *id })?;
        if !table.is_active {
            return Err(CoreError::Validation(format!(
                "Table {} is not in service",
                table.number
            )));
        }
        total += table.capacity;
    }

    if total < party_size {
        return Err(CoreError::Validation(format!(
            "Selected tables seat {total}, party needs {party_size}"
        )));
    }
    if let Some(buffer) = capacity_buffer {
        let max = (f64::from(party_size) * buffer).ceil() as i32;
        if total > max {
            return Err(CoreError::Validation(format!(
                "Selected tables seat {total}, at most {max} allowed for a party of {party_size}"
            )));
        }
    }
    Ok(())
}

/// Commit a reservation with a fixed table assignment.
///
/// The search result is only a hint: the store re-checks the tables and the
/// slot ceiling under lock and answers [`CoreError::Conflict`] when another
/// booking got there first.
pub async fn assign_tables(
    store: &dyn ReservationStore,
    policy: &BookingPolicy,
    request: BookingRequest,
    now: DateTime<Utc>,
) -> Result<BookingConfirmation, CoreError> {
    availability::validate_party_size(request.party_size)?;
    let is_public = request.origin == ReservationOrigin::Public;

    if is_public {
        if !request.consent.data_processing {
            return Err(CoreError::Validation(
                "Data processing consent is required".into(),
            ));
        }
        if request.date.and_time(request.time) <= policy.local_now(now) {
            return Err(CoreError::Validation(
                "Reservation date and time must be in the future".into(),
            ));
        }
    }

    let plan = load_day_plan(store, request.date).await?;
    let turn_ceiling = plan.turn_for(request.time).map(|(_, turn)| turn.per_slot_ceiling);

    let table_ids = match &request.table_ids {
        Some(selected) => {
            let tables = store.list_tables().await?;
            validate_selection(&tables, selected, request.party_size, policy.capacity_buffer)?;
            if is_public {
                if !plan.is_open {
                    return Err(unavailable_error(UnavailableReason::Closed));
                }
                if turn_ceiling.is_none() {
                    return Err(unavailable_error(UnavailableReason::OutsideServiceHours));
                }
            }
            selected.clone()
        }
        None => {
            let query = AvailabilityQuery {
                date: request.date,
                time: request.time,
                party_size: request.party_size,
                zone: request.zone.clone(),
            };
            let tables = store.list_tables().await?;
            let reservations = store.list_reservations(request.date).await?;
            let limits = SearchLimits {
                enforce_slot_ceiling: is_public,
                ..policy.limits()
            };
            match availability::resolve(&query, &tables, &reservations, &plan, &limits)? {
                AvailabilityOutcome::Available { candidates, .. } => candidates
                    .into_iter()
                    .next()
                    .map(|c| c.table_ids)
                    .ok_or_else(|| unavailable_error(UnavailableReason::TablesBooked))?,
                AvailabilityOutcome::NoAvailability { reason } => {
                    return Err(unavailable_error(reason))
                }
                AvailabilityOutcome::ExceedsGroupableCapacity {
                    max_groupable_capacity,
                } => {
                    return Err(CoreError::Validation(format!(
                        "Party of {} exceeds the largest table grouping ({max_groupable_capacity} seats)",
                        request.party_size
                    )))
                }
            }
        }
    };

    let status = request.origin.initial_status();
    let reservation = NewReservation {
        customer_name: request.customer_name,
        customer_email: request.customer_email,
        customer_phone: request.customer_phone,
        date: request.date,
        time: request.time,
        party_size: request.party_size,
        table_ids,
        status,
        origin: request.origin,
        consent: request.consent,
        special_requests: request.special_requests,
    };
    let guard = CommitGuard {
        turnover_minutes: policy.turnover_minutes,
        // Admin bookings may go over the slot ceiling.
        slot_ceiling: if is_public { turn_ceiling } else { None },
    };

    let reservation_id = store.create_reservation(&reservation, &guard).await?;
    tracing::info!(
        reservation_id,
        date = %reservation.date,
        time = %reservation.time,
        party_size = reservation.party_size,
        tables = ?reservation.table_ids,
        "Reservation committed",
    );

    Ok(BookingConfirmation {
        reservation_id,
        status,
        date: reservation.date,
        time: reservation.time,
        party_size: reservation.party_size,
        table_ids: reservation.table_ids,
    })
}

fn unavailable_error(reason: UnavailableReason) -> CoreError {
    match reason {
        UnavailableReason::Closed => {
            CoreError::Validation("The restaurant is closed on that date".into())
        }
        UnavailableReason::OutsideServiceHours => {
            CoreError::Validation("The requested time is not a bookable slot".into())
        }
        UnavailableReason::SlotCapacityReached => {
            CoreError::Conflict("The requested slot is full".into())
        }
        UnavailableReason::TablesBooked => {
            CoreError::Conflict("No table is available at the requested time".into())
        }
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusChange {
    pub reservation_id: DbId,
    pub from: ReservationStatus,
    pub to: ReservationStatus,
}

pub async fn update_status(
    store: &dyn ReservationStore,
    reservation_id: DbId,
    to: ReservationStatus,
) -> Result<StatusChange, CoreError> {
    let current = store
        .get_reservation(reservation_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "reservation",
            id: reservation_id,
        })?;

    state_machine::validate_transition(current.status, to).map_err(CoreError::Validation)?;
    store
        .update_reservation_status(reservation_id, current.status, to)
        .await?;

    tracing::info!(
        reservation_id,
        from = current.status.as_str(),
        to = to.as_str(),
        "Reservation status changed",
    );
    Ok(StatusChange {
        reservation_id,
        from: current.status,
        to,
    })
}
