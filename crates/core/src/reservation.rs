//! Reservation lifecycle, booking rows as seen by the core, and the
//! time-overlap rule used to decide whether a table is taken.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

/// Minutes a table stays occupied after a reservation's start time.
pub const DEFAULT_TABLE_TURNOVER_MINUTES: i64 = 150;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Reservation status as stored in the `reservations.status` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Seated,
    Completed,
    Cancelled,
    NoShow,
}

impl ReservationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Seated => "seated",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::NoShow => "no_show",
        }
    }

    /// Parse the stored representation. Accepts the upper-case spelling
    /// older rows were written with.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "seated" => Ok(Self::Seated),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            "no_show" => Ok(Self::NoShow),
            other => Err(CoreError::Validation(format!(
                "Unknown reservation status: '{other}'"
            ))),
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::NoShow)
    }

    /// Whether a reservation in this status holds its tables and counts
    /// against the slot ceiling. Only live bookings do.
    pub fn holds_tables(self) -> bool {
        !self.is_terminal()
    }
}

/// Valid status transitions.
pub mod state_machine {
    use super::ReservationStatus::{self, *};

    /// Returns the statuses reachable from `from`.
    ///
    /// Terminal states (Completed, Cancelled, NoShow) return an empty slice.
    pub fn valid_transitions(from: ReservationStatus) -> &'static [ReservationStatus] {
        match from {
            Pending => &[Confirmed, Cancelled, NoShow],
            Confirmed => &[Seated, Cancelled, NoShow],
            Seated => &[Completed, Cancelled, NoShow],
            Completed | Cancelled | NoShow => &[],
        }
    }

    pub fn can_transition(from: ReservationStatus, to: ReservationStatus) -> bool {
        valid_transitions(from).contains(&to)
    }

    /// Validate a transition, returning a descriptive message for invalid ones.
    pub fn validate_transition(from: ReservationStatus, to: ReservationStatus) -> Result<(), String> {
        if can_transition(from, to) {
            Ok(())
        } else {
            Err(format!(
                "Invalid transition: {} -> {}",
                from.as_str(),
                to.as_str()
            ))
        }
    }
}

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

/// Where a reservation was created. Admin-origin bookings skip the
/// pending state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationOrigin {
    #[default]
    Public,
    Admin,
}

impl ReservationOrigin {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Admin => "admin",
        }
    }

    pub fn initial_status(self) -> ReservationStatus {
        match self {
            Self::Public => ReservationStatus::Pending,
            Self::Admin => ReservationStatus::Confirmed,
        }
    }
}

/// An existing reservation, reduced to what capacity math needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookedReservation {
    pub id: DbId,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub party_size: i32,
    pub status: ReservationStatus,
    pub table_ids: Vec<DbId>,
}

impl BookedReservation {
    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }
}

/// Consent flags captured with the booking form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentFlags {
    pub data_processing: bool,
    pub email: bool,
    pub marketing: bool,
}

/// A reservation about to be committed with a fixed table assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewReservation {
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub party_size: i32,
    pub table_ids: Vec<DbId>,
    pub status: ReservationStatus,
    pub origin: ReservationOrigin,
    pub consent: ConsentFlags,
    pub special_requests: Option<String>,
}

// ---------------------------------------------------------------------------
// Overlap
// ---------------------------------------------------------------------------

/// Two start times conflict when they are less than `turnover_minutes` apart.
pub fn starts_overlap(a: NaiveDateTime, b: NaiveDateTime, turnover_minutes: i64) -> bool {
    (a - b).num_minutes().abs() < turnover_minutes
}

/// Tables held by reservations that overlap `at`.
pub fn occupied_table_ids(
    reservations: &[BookedReservation],
    at: NaiveDateTime,
    turnover_minutes: i64,
) -> std::collections::BTreeSet<DbId> {
    reservations
        .iter()
        .filter(|r| r.status.holds_tables())
        .filter(|r| starts_overlap(r.starts_at(), at, turnover_minutes))
        .flat_map(|r| r.table_ids.iter().copied())
        .collect()
}

/// Sum of party sizes already booked at exactly `date`/`time`.
pub fn booked_in_slot(reservations: &[BookedReservation], date: NaiveDate, time: NaiveTime) -> i32 {
    reservations
        .iter()
        .filter(|r| r.status.holds_tables() && r.date == date && r.time == time)
        .map(|r| r.party_size)
        .sum()
}
