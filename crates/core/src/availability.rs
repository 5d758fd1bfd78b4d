//! Table availability resolution.
//!
//! [`resolve`] is pure: it takes the floor, the day's reservations and the
//! day plan, and answers which tables (or combinations of tables) can seat
//! a party. Checks run in a fixed order so the negative outcomes stay
//! distinguishable:
//!
//! 1. input validation (errors, not outcomes)
//! 2. geometric impossibility: no zone could ever seat the party, even empty
//! 3. service lookup: day closed, or time not a bookable slot
//! 4. per-slot turn ceiling
//! 5. table search against existing bookings

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::capacity::{DayPlan, ServiceKind, TurnName};
use crate::error::CoreError;
use crate::floor::group_by_zone;
use crate::reservation::{booked_in_slot, occupied_table_ids, BookedReservation};
use crate::table::DiningTable;
use crate::types::DbId;

pub const DEFAULT_MAX_COMBINED_TABLES: usize = 4;
pub const DEFAULT_MAX_CANDIDATES: usize = 10;
pub const MAX_PARTY_SIZE: i32 = 100;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityQuery {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub party_size: i32,
    /// Restrict the search to one location tag.
    #[serde(default)]
    pub zone: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchLimits {
    pub turnover_minutes: i64,
    pub max_combined_tables: usize,
    pub max_candidates: usize,
    /// Admin bookings search with this off.
    pub enforce_slot_ceiling: bool,
}

/// One way to seat the party: a single table or a same-zone combination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub table_ids: Vec<DbId>,
    pub table_numbers: Vec<String>,
    pub location: String,
    pub total_capacity: i32,
    pub wasted_seats: i32,
}

impl Candidate {
    fn from_tables(tables: &[&DiningTable], party_size: i32) -> Self {
        let total_capacity = tables.iter().map(|t| t.capacity).sum();
        Self {
            table_ids: tables.iter().map(|t| t.id).collect(),
            table_numbers: tables.iter().map(|t| t.number.clone()).collect(),
            location: tables
                .first()
                .map(|t| t.location.clone())
                .unwrap_or_default(),
            total_capacity,
            wasted_seats: total_capacity - party_size,
        }
    }

    pub fn is_combination(&self) -> bool {
        self.table_ids.len() > 1
    }

    /// Fewest tables, then fewest wasted seats, then lowest ids.
    fn rank_key(&self) -> (usize, i32, &[DbId]) {
        (self.table_ids.len(), self.wasted_seats, &self.table_ids)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnavailableReason {
    /// The restaurant does not open that day.
    Closed,
    /// The time is not a bookable slot of any sitting.
    OutsideServiceHours,
    /// The sitting's per-slot ceiling would be exceeded.
    SlotCapacityReached,
    /// Enough seats exist, but the tables are taken at that time.
    TablesBooked,
}

/// Answer to an availability query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AvailabilityOutcome {
    Available {
        service: ServiceKind,
        turn: TurnName,
        remaining_in_slot: i32,
        candidates: Vec<Candidate>,
    },
    NoAvailability {
        reason: UnavailableReason,
    },
    /// The party is larger than any zone can seat, bookings aside.
    ExceedsGroupableCapacity {
        max_groupable_capacity: i32,
    },
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

pub fn validate_party_size(party_size: i32) -> Result<(), CoreError> {
    if !(1..=MAX_PARTY_SIZE).contains(&party_size) {
        return Err(CoreError::Validation(format!(
            "party_size must be between 1 and {MAX_PARTY_SIZE}, got {party_size}"
        )));
    }
    Ok(())
}

fn validate_limits(limits: &SearchLimits) -> Result<(), CoreError> {
    if limits.max_combined_tables < 1 || limits.max_candidates < 1 {
        return Err(CoreError::Validation(
            "max_combined_tables and max_candidates must be at least 1".into(),
        ));
    }
    if limits.turnover_minutes < 1 {
        return Err(CoreError::Validation(
            "turnover_minutes must be at least 1".into(),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Largest party any single zone could seat with at most `max_tables`
/// active tables, ignoring bookings.
pub fn max_groupable_capacity(tables: &[DiningTable], max_tables: usize) -> i32 {
    let active: Vec<DiningTable> = tables.iter().filter(|t| t.is_active).cloned().collect();
    group_by_zone(&active)
        .into_values()
        .map(|zone| {
            let mut caps: Vec<i32> = zone.iter().map(|t| t.capacity).collect();
            caps.sort_unstable_by(|a, b| b.cmp(a));
            caps.into_iter().take(max_tables).sum::<i32>()
        })
        .max()
        .unwrap_or(0)
}

pub fn resolve(
    query: &AvailabilityQuery,
    tables: &[DiningTable],
    same_day: &[BookedReservation],
    plan: &DayPlan,
    limits: &SearchLimits,
) -> Result<AvailabilityOutcome, CoreError> {
    validate_party_size(query.party_size)?;
    validate_limits(limits)?;

    let in_scope: Vec<DiningTable> = tables
        .iter()
        .filter(|t| t.is_active)
        .filter(|t| query.zone.as_deref().map_or(true, |z| t.location == z))
        .cloned()
        .collect();

    let max_groupable = max_groupable_capacity(&in_scope, limits.max_combined_tables);
    if query.party_size > max_groupable {
        return Ok(AvailabilityOutcome::ExceedsGroupableCapacity {
            max_groupable_capacity: max_groupable,
        });
    }

    if !plan.is_open {
        return Ok(no_availability(UnavailableReason::Closed));
    }
    let Some((service, turn)) = plan.turn_for(query.time) else {
        return Ok(no_availability(UnavailableReason::OutsideServiceHours));
    };

    let booked = booked_in_slot(same_day, query.date, query.time);
    let remaining = turn.per_slot_ceiling - booked;
    if limits.enforce_slot_ceiling && query.party_size > remaining {
        return Ok(no_availability(UnavailableReason::SlotCapacityReached));
    }

    let taken = occupied_table_ids(
        same_day,
        query.date.and_time(query.time),
        limits.turnover_minutes,
    );
    let free: Vec<&DiningTable> = in_scope.iter().filter(|t| !taken.contains(&t.id)).collect();
    let candidates = rank_candidates(&free, query.party_size, limits);

    if candidates.is_empty() {
        return Ok(no_availability(UnavailableReason::TablesBooked));
    }
    Ok(AvailabilityOutcome::Available {
        service,
        turn: turn.name,
        remaining_in_slot: remaining,
        candidates,
    })
}

fn no_availability(reason: UnavailableReason) -> AvailabilityOutcome {
    AvailabilityOutcome::NoAvailability { reason }
}

/// Single tables that fit, smallest first; only when none fits, minimal
/// same-zone combinations of up to `max_combined_tables` tables.
pub fn rank_candidates(
    free: &[&DiningTable],
    party_size: i32,
    limits: &SearchLimits,
) -> Vec<Candidate> {
    let mut singles: Vec<&DiningTable> = free
        .iter()
        .copied()
        .filter(|t| t.capacity >= party_size)
        .collect();
    if !singles.is_empty() {
        singles.sort_by_key(|t| (t.capacity, t.id));
        return singles
            .into_iter()
            .take(limits.max_candidates)
            .map(|t| Candidate::from_tables(&[t], party_size))
            .collect();
    }

    let mut by_zone: BTreeMap<&str, Vec<&DiningTable>> = BTreeMap::new();
    for &t in free {
        by_zone.entry(t.location.as_str()).or_default().push(t);
    }
    for zone in by_zone.values_mut() {
        zone.sort_by_key(|t| t.id);
    }

    let mut found: Vec<Candidate> = Vec::new();
    for size in 2..=limits.max_combined_tables {
        for zone in by_zone.values() {
            let mut picked = Vec::with_capacity(size);
            collect_combinations(zone, size, 0, &mut picked, party_size, &mut found);
        }
        // Larger combinations always rank after smaller ones.
        if found.len() >= limits.max_candidates {
            break;
        }
    }

    found.sort_by(|a, b| a.rank_key().cmp(&b.rank_key()));
    found.truncate(limits.max_candidates);
    found
}

fn collect_combinations<'a>(
    zone: &[&'a DiningTable],
    size: usize,
    start: usize,
    picked: &mut Vec<&'a DiningTable>,
    party_size: i32,
    out: &mut Vec<Candidate>,
) {
    if picked.len() == size {
        if is_minimal(picked, party_size) {
            out.push(Candidate::from_tables(picked, party_size));
        }
        return;
    }
    let needed = size - picked.len();
    for i in start..zone.len() {
        if zone.len() - i < needed {
            break;
        }
        picked.push(zone[i]);
        collect_combinations(zone, size, i + 1, picked, party_size, out);
        picked.pop();
    }
}

/// Seats the party, and no table could be dropped while still seating it.
fn is_minimal(tables: &[&DiningTable], party_size: i32) -> bool {
    let total: i32 = tables.iter().map(|t| t.capacity).sum();
    total >= party_size && tables.iter().all(|t| total - t.capacity < party_size)
}
