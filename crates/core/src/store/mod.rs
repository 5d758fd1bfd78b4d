//! The reservation store seam.
//!
//! Every operation that touches persisted state receives a
//! `&dyn ReservationStore`. The Postgres implementation lives in the `db`
//! crate; [`InMemoryStore`] backs unit and router tests.

mod memory;

pub use memory::InMemoryStore;

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;

use crate::capacity::ServiceDayConfig;
use crate::error::CoreError;
use crate::reservation::{BookedReservation, NewReservation, ReservationStatus};
use crate::table::DiningTable;
use crate::types::DbId;

/// Failure reported by a store implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Connection, pool or I/O failure. Retryable.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A guarded write lost against a concurrent booking or a uniqueness rule.
    #[error("{0}")]
    Conflict(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: DbId },

    /// The store rejected the data (constraint or check violation).
    #[error("invalid data: {0}")]
    Invalid(String),
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) => CoreError::StoreUnavailable(msg),
            StoreError::Conflict(msg) => CoreError::Conflict(msg),
            StoreError::NotFound { entity, id } => CoreError::NotFound { entity, id },
            StoreError::Invalid(msg) => CoreError::Validation(msg),
        }
    }
}

/// Non-cancelled bookings for one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyAggregate {
    pub date: NaiveDate,
    pub count: i64,
    pub total_party_size: i64,
}

/// Conditions a reservation insert must re-check while holding its locks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitGuard {
    /// Minutes a table stays held after a reservation's start.
    pub turnover_minutes: i64,
    /// Per-slot seat ceiling of the turn the reservation falls in. `None`
    /// skips the ceiling check (admin overrides).
    pub slot_ceiling: Option<i32>,
}

#[async_trait]
pub trait ReservationStore: Send + Sync {
    /// All tables, active and inactive.
    async fn list_tables(&self) -> Result<Vec<DiningTable>, StoreError>;

    /// Every reservation on `date`, any status, with its table assignment.
    async fn list_reservations(&self, date: NaiveDate)
        -> Result<Vec<BookedReservation>, StoreError>;

    async fn get_reservation(&self, id: DbId) -> Result<Option<BookedReservation>, StoreError>;

    /// Capacity configuration for a weekday (0 = Sunday), if one is stored.
    async fn service_config(&self, day_of_week: u32)
        -> Result<Option<ServiceDayConfig>, StoreError>;

    /// Occupancy-report ceilings keyed by weekday (0 = Sunday).
    async fn occupancy_ceilings(&self) -> Result<BTreeMap<u32, i32>, StoreError>;

    /// Per-day counts of non-cancelled reservations in `start..=end`. Days
    /// without bookings may be omitted.
    async fn daily_aggregates(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyAggregate>, StoreError>;

    async fn update_table_position(&self, id: DbId, x: f64, y: f64) -> Result<(), StoreError>;

    async fn update_table_dimensions(
        &self,
        id: DbId,
        width: f64,
        height: f64,
    ) -> Result<(), StoreError>;

    /// Insert a reservation and its table links atomically.
    ///
    /// Implementations must serialize against concurrent inserts for the
    /// same tables, then re-check that every table is active and free
    /// within the guard's turnover window and that the slot ceiling still
    /// holds. A failed check is a [`StoreError::Conflict`].
    async fn create_reservation(
        &self,
        reservation: &NewReservation,
        guard: &CommitGuard,
    ) -> Result<DbId, StoreError>;

    /// Move a reservation from `from` to `to`.
    ///
    /// The write only applies while the stored status is still `from`;
    /// otherwise a concurrent change won and the call is a
    /// [`StoreError::Conflict`].
    async fn update_reservation_status(
        &self,
        id: DbId,
        from: ReservationStatus,
        to: ReservationStatus,
    ) -> Result<(), StoreError>;

    /// Cheap round trip used by health checks.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Shared commit-time checks, evaluated against the reservations already
/// on the requested date and the current table rows.
pub fn check_commit(
    reservation: &NewReservation,
    guard: &CommitGuard,
    tables: &[DiningTable],
    same_day: &[BookedReservation],
) -> Result<(), StoreError> {
    if reservation.table_ids.is_empty() {
        return Err(StoreError::Invalid("reservation has no tables".into()));
    }
    for id in &reservation.table_ids {
        match tables.iter().find(|t| t.id == *id) {
            None => return Err(StoreError::NotFound { entity: "table", id: *id }),
            Some(t) if !t.is_active => {
                return Err(StoreError::Conflict(format!(
                    "Table {} is no longer available",
                    t.number
                )))
            }
            Some(_) => {}
        }
    }

    let at = reservation.date.and_time(reservation.time);
    let taken = crate::reservation::occupied_table_ids(same_day, at, guard.turnover_minutes);
    if let Some(id) = reservation.table_ids.iter().find(|id| taken.contains(id)) {
        let number = tables
            .iter()
            .find(|t| t.id == *id)
            .map(|t| t.number.as_str())
            .unwrap_or("?");
        return Err(StoreError::Conflict(format!(
            "Table {number} is no longer available"
        )));
    }

    if let Some(ceiling) = guard.slot_ceiling {
        let booked =
            crate::reservation::booked_in_slot(same_day, reservation.date, reservation.time);
        if booked + reservation.party_size > ceiling {
            return Err(StoreError::Conflict(format!(
                "Slot {} is full ({booked} of {ceiling} seats booked)",
                reservation.time.format("%H:%M")
            )));
        }
    }

    Ok(())
}
