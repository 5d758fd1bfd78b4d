//! Per-turn capacity planning.
//!
//! A service (lunch or dinner) is cut into discrete booking slots and split
//! into two sittings. Each sitting gets a per-slot seat ceiling derived from
//! the restaurant's seat count and target occupancy:
//!
//! ```text
//! target   = floor(total_capacity * target_occupancy)
//! per_slot = ceil(target / slots_in_turn)
//! ```
//!
//! The floor keeps total headcount conservative; the ceiling errs towards
//! availability per slot.

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Defaults (used when a weekday has no configuration row)
// ---------------------------------------------------------------------------

pub const DEFAULT_TOTAL_CAPACITY: i32 = 63;
pub const DEFAULT_TARGET_OCCUPANCY: f64 = 0.80;
pub const DEFAULT_SLOT_MINUTES: i64 = 15;

/// Lunch: the first sitting always covers the first five slots.
pub const LUNCH_FIRST_TURN_SLOTS: usize = 5;
/// Dinner: number of slots left unbookable between the two sittings.
pub const DINNER_TURN_GAP_SLOTS: usize = 1;

/// Absorbs binary rounding in `total * ratio` (e.g. `100 * 0.29`).
const RATIO_EPSILON: f64 = 1e-9;

// ---------------------------------------------------------------------------
// Core arithmetic
// ---------------------------------------------------------------------------

/// Aggregate seat target for a service: `floor(total * ratio)`.
pub fn target_capacity(total_capacity: i32, target_occupancy: f64) -> i32 {
    (f64::from(total_capacity) * target_occupancy + RATIO_EPSILON).floor() as i32
}

/// Seats bookable per slot within a turn of `slots_in_turn` slots.
pub fn turn_ceiling(
    total_capacity: i32,
    target_occupancy: f64,
    slots_in_turn: i32,
) -> Result<i32, CoreError> {
    if total_capacity <= 0 {
        return Err(CoreError::Validation(format!(
            "total_capacity must be positive, got {total_capacity}"
        )));
    }
    if !(target_occupancy > 0.0 && target_occupancy <= 1.0) {
        return Err(CoreError::Validation(format!(
            "target_occupancy must be in (0, 1], got {target_occupancy}"
        )));
    }
    if slots_in_turn < 1 {
        return Err(CoreError::Validation(format!(
            "slots_in_turn must be at least 1, got {slots_in_turn}"
        )));
    }

    let target = i64::from(target_capacity(total_capacity, target_occupancy));
    let slots = i64::from(slots_in_turn);
    // target <= total_capacity, so the quotient fits back into i32.
    Ok(((target + slots - 1) / slots) as i32)
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Opening window of one service. Bookings start no later than
/// `last_reservation`, which may not fall after `close`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceWindow {
    pub open: NaiveTime,
    pub close: NaiveTime,
    pub last_reservation: NaiveTime,
}

/// Capacity configuration for one weekday (`day_of_week` 0 = Sunday).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceDayConfig {
    pub day_of_week: u32,
    pub is_open: bool,
    pub total_capacity: i32,
    pub target_occupancy: f64,
    pub slot_minutes: i64,
    pub lunch: Option<ServiceWindow>,
    pub dinner: ServiceWindow,
}

impl ServiceDayConfig {
    /// Dinner-only defaults used when the weekday has no stored row.
    pub fn fallback(day_of_week: u32) -> Self {
        Self {
            day_of_week,
            is_open: true,
            total_capacity: DEFAULT_TOTAL_CAPACITY,
            target_occupancy: DEFAULT_TARGET_OCCUPANCY,
            slot_minutes: DEFAULT_SLOT_MINUTES,
            lunch: None,
            dinner: ServiceWindow {
                open: hm(18, 30),
                close: hm(23, 0),
                last_reservation: hm(22, 0),
            },
        }
    }
}

fn hm(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap_or(NaiveTime::MIN)
}

// ---------------------------------------------------------------------------
// Slots and turns
// ---------------------------------------------------------------------------

/// Every `interval_minutes` from `start` up to and including `end`.
///
/// Returns an empty list when `end` precedes `start`.
pub fn generate_time_slots(
    start: NaiveTime,
    end: NaiveTime,
    interval_minutes: i64,
) -> Result<Vec<NaiveTime>, CoreError> {
    if interval_minutes <= 0 {
        return Err(CoreError::Validation(format!(
            "slot interval must be positive, got {interval_minutes}"
        )));
    }

    let start_min = i64::from(start.hour() * 60 + start.minute());
    let end_min = i64::from(end.hour() * 60 + end.minute());

    let mut slots = Vec::new();
    let mut current = start_min;
    while current <= end_min {
        let h = (current / 60) as u32;
        let m = (current % 60) as u32;
        if let Some(t) = NaiveTime::from_hms_opt(h, m, 0) {
            slots.push(t);
        }
        current += interval_minutes;
    }
    Ok(slots)
}

/// Split dinner slots roughly in half with a one-slot gap between sittings.
///
/// With two or fewer slots everything belongs to the first sitting.
pub fn split_dinner_slots(all: &[NaiveTime]) -> (Vec<NaiveTime>, Vec<NaiveTime>) {
    let total = all.len();
    if total <= 2 {
        return (all.to_vec(), Vec::new());
    }
    let first_count = total / 2;
    let second_start = (first_count + DINNER_TURN_GAP_SLOTS).min(total - 1);
    (all[..first_count].to_vec(), all[second_start..].to_vec())
}

/// Split lunch slots: the first five form the early sitting, the rest the
/// late sitting, with no gap.
pub fn split_lunch_slots(all: &[NaiveTime]) -> (Vec<NaiveTime>, Vec<NaiveTime>) {
    let cut = LUNCH_FIRST_TURN_SLOTS.min(all.len());
    (all[..cut].to_vec(), all[cut..].to_vec())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceKind {
    Lunch,
    Dinner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnName {
    FirstSitting,
    SecondSitting,
}

impl TurnName {
    pub fn label(self) -> &'static str {
        match self {
            Self::FirstSitting => "First sitting",
            Self::SecondSitting => "Second sitting",
        }
    }
}

/// A sitting: a run of bookable slots sharing one per-slot ceiling.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceTurn {
    pub name: TurnName,
    pub slots: Vec<NaiveTime>,
    pub per_slot_ceiling: i32,
}

impl ServiceTurn {
    fn build(
        name: TurnName,
        slots: Vec<NaiveTime>,
        config: &ServiceDayConfig,
    ) -> Result<Option<Self>, CoreError> {
        if slots.is_empty() {
            return Ok(None);
        }
        let per_slot_ceiling = turn_ceiling(
            config.total_capacity,
            config.target_occupancy,
            slots.len() as i32,
        )?;
        Ok(Some(Self {
            name,
            slots,
            per_slot_ceiling,
        }))
    }

    pub fn contains(&self, time: NaiveTime) -> bool {
        self.slots.contains(&time)
    }

    /// Seats bookable across every slot of the turn.
    pub fn total_capacity(&self) -> i32 {
        self.per_slot_ceiling * self.slots.len() as i32
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServicePlan {
    pub kind: ServiceKind,
    pub window: ServiceWindow,
    pub turns: Vec<ServiceTurn>,
}

/// All services and sittings for one weekday.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayPlan {
    pub day_of_week: u32,
    pub is_open: bool,
    pub total_capacity: i32,
    pub target_capacity: i32,
    pub target_occupancy: f64,
    pub services: Vec<ServicePlan>,
}

impl DayPlan {
    /// The service and turn that own a slot start time, if any.
    pub fn turn_for(&self, time: NaiveTime) -> Option<(ServiceKind, &ServiceTurn)> {
        self.services.iter().find_map(|service| {
            service
                .turns
                .iter()
                .find(|turn| turn.contains(time))
                .map(|turn| (service.kind, turn))
        })
    }
}

/// Build the day's services and sittings from its configuration.
pub fn plan_day(config: &ServiceDayConfig) -> Result<DayPlan, CoreError> {
    let mut services = Vec::new();

    if config.is_open {
        if let Some(lunch) = config.lunch {
            validate_window(ServiceKind::Lunch, &lunch)?;
            let slots = generate_time_slots(lunch.open, lunch.last_reservation, config.slot_minutes)?;
            let (first, second) = split_lunch_slots(&slots);
            services.push(service_plan(ServiceKind::Lunch, lunch, first, second, config)?);
        }

        validate_window(ServiceKind::Dinner, &config.dinner)?;
        let slots = generate_time_slots(
            config.dinner.open,
            config.dinner.last_reservation,
            config.slot_minutes,
        )?;
        let (first, second) = split_dinner_slots(&slots);
        services.push(service_plan(ServiceKind::Dinner, config.dinner, first, second, config)?);
    }

    Ok(DayPlan {
        day_of_week: config.day_of_week,
        is_open: config.is_open,
        total_capacity: config.total_capacity,
        target_capacity: target_capacity(config.total_capacity, config.target_occupancy),
        target_occupancy: config.target_occupancy,
        services,
    })
}

fn validate_window(kind: ServiceKind, window: &ServiceWindow) -> Result<(), CoreError> {
    if window.last_reservation > window.close {
        return Err(CoreError::Validation(format!(
            "{kind:?} last reservation {} is after closing time {}",
            window.last_reservation, window.close
        )));
    }
    Ok(())
}

fn service_plan(
    kind: ServiceKind,
    window: ServiceWindow,
    first: Vec<NaiveTime>,
    second: Vec<NaiveTime>,
    config: &ServiceDayConfig,
) -> Result<ServicePlan, CoreError> {
    let turns = [
        ServiceTurn::build(TurnName::FirstSitting, first, config)?,
        ServiceTurn::build(TurnName::SecondSitting, second, config)?,
    ]
    .into_iter()
    .flatten()
    .collect();

    Ok(ServicePlan {
        kind,
        window,
        turns,
    })
}

// ---------------------------------------------------------------------------
// Slot availability
// ---------------------------------------------------------------------------

/// Load of one slot against its ceiling.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotAvailability {
    pub time: NaiveTime,
    pub available: bool,
    pub current_persons: i32,
    pub max_persons: i32,
    pub remaining_capacity: i32,
    pub utilization_percent: i32,
}

pub fn slot_availability(
    time: NaiveTime,
    current_persons: i32,
    max_persons: i32,
    requested_party: i32,
) -> SlotAvailability {
    let remaining_capacity = max_persons - current_persons;
    let utilization_percent = if max_persons > 0 {
        (f64::from(current_persons) / f64::from(max_persons) * 100.0).round() as i32
    } else {
        0
    };
    SlotAvailability {
        time,
        available: remaining_capacity >= requested_party,
        current_persons,
        max_persons,
        remaining_capacity,
        utilization_percent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -- turn_ceiling --

    #[test]
    fn ceiling_for_first_sitting_example() {
        // floor(63 * 0.80) = 50, ceil(50 / 7) = 8
        assert_eq!(target_capacity(63, 0.80), 50);
        assert_eq!(turn_ceiling(63, 0.80, 7).unwrap(), 8);
    }

    #[test]
    fn ceiling_for_second_sitting_example() {
        // ceil(50 / 6) = 9
        assert_eq!(turn_ceiling(63, 0.80, 6).unwrap(), 9);
    }

    #[test]
    fn ceiling_does_not_overflow_on_huge_capacity() {
        assert_eq!(turn_ceiling(i32::MAX, 1.0, 1).unwrap(), i32::MAX);
        // ceil(2147483647 / 7) = 306783379 (7 * 306783378 = 2147483646)
        assert_eq!(turn_ceiling(i32::MAX, 1.0, 7).unwrap(), 306_783_379);
    }

    #[test]
    fn target_tolerates_binary_rounding() {
        assert_eq!(target_capacity(100, 0.29), 29);
        assert_eq!(target_capacity(10, 0.7), 7);
    }

    #[test]
    fn ceiling_rejects_bad_inputs() {
        assert!(turn_ceiling(0, 0.8, 7).is_err());
        assert!(turn_ceiling(63, 0.0, 7).is_err());
        assert!(turn_ceiling(63, 1.01, 7).is_err());
        assert!(turn_ceiling(63, f64::NAN, 7).is_err());
        assert!(turn_ceiling(63, 0.8, 0).is_err());
        assert!(turn_ceiling(63, 1.0, 1).is_ok());
    }

    #[test]
    fn ceiling_monotone_in_capacity_and_ratio_antitone_in_slots() {
        let ratios = [0.05, 0.1, 0.25, 0.29, 0.5, 0.7, 0.8, 0.95, 1.0];
        for slots in 1..=12 {
            for &ratio in &ratios {
                let mut prev = 0;
                for total in 1..=200 {
                    let c = turn_ceiling(total, ratio, slots).unwrap();
                    assert!(c >= prev, "capacity {total} ratio {ratio} slots {slots}");
                    prev = c;
                }
            }
            for total in [1, 7, 63, 150] {
                let mut prev = 0;
                for &ratio in &ratios {
                    let c = turn_ceiling(total, ratio, slots).unwrap();
                    assert!(c >= prev, "ratio {ratio} capacity {total} slots {slots}");
                    prev = c;
                }
            }
        }
        for total in [1, 7, 63, 150] {
            for &ratio in &ratios {
                let mut prev = i32::MAX;
                for slots in 1..=20 {
                    let c = turn_ceiling(total, ratio, slots).unwrap();
                    assert!(c <= prev, "slots {slots} capacity {total} ratio {ratio}");
                    prev = c;
                }
            }
        }
    }

    // -- slots --

    #[test]
    fn slots_include_end() {
        let slots = generate_time_slots(hm(18, 30), hm(19, 30), 15).unwrap();
        assert_eq!(slots, vec![hm(18, 30), hm(18, 45), hm(19, 0), hm(19, 15), hm(19, 30)]);
    }

    #[test]
    fn slots_empty_when_end_before_start() {
        assert!(generate_time_slots(hm(22, 0), hm(18, 0), 15).unwrap().is_empty());
    }

    #[test]
    fn slots_reject_zero_interval() {
        assert!(generate_time_slots(hm(18, 0), hm(22, 0), 0).is_err());
    }

    #[test]
    fn dinner_split_leaves_one_slot_gap() {
        // 18:30..=21:45 -> 14 slots: 7 first, gap at 20:15, 6 second
        let slots = generate_time_slots(hm(18, 30), hm(21, 45), 15).unwrap();
        let (first, second) = split_dinner_slots(&slots);
        assert_eq!(first.len(), 7);
        assert_eq!(second.len(), 6);
        assert_eq!(*first.last().unwrap(), hm(20, 0));
        assert_eq!(second[0], hm(20, 30));
    }

    #[test]
    fn dinner_split_small_service_is_single_turn() {
        let slots = vec![hm(20, 0), hm(20, 15)];
        let (first, second) = split_dinner_slots(&slots);
        assert_eq!(first.len(), 2);
        assert!(second.is_empty());
    }

    #[test]
    fn lunch_split_first_five() {
        let slots = generate_time_slots(hm(13, 0), hm(15, 0), 15).unwrap();
        let (first, second) = split_lunch_slots(&slots);
        assert_eq!(first.len(), 5);
        assert_eq!(*first.last().unwrap(), hm(14, 0));
        assert_eq!(second[0], hm(14, 15));
        assert_eq!(second.len(), 4);
    }

    // -- plan_day --

    #[test]
    fn fallback_plan_is_dinner_only() {
        let plan = plan_day(&ServiceDayConfig::fallback(5)).unwrap();
        assert_eq!(plan.services.len(), 1);
        assert_eq!(plan.services[0].kind, ServiceKind::Dinner);
        assert_eq!(plan.target_capacity, 50);

        // 18:30..=22:00 -> 15 slots: 7 + gap + 7
        let turns = &plan.services[0].turns;
        assert_eq!(turns[0].slots.len(), 7);
        assert_eq!(turns[0].per_slot_ceiling, 8);
        assert_eq!(turns[1].slots.len(), 7);
        assert_eq!(turns[0].total_capacity(), 56);
    }

    #[test]
    fn plan_with_lunch_has_two_services() {
        let mut config = ServiceDayConfig::fallback(6);
        config.lunch = Some(ServiceWindow {
            open: hm(13, 0),
            close: hm(16, 0),
            last_reservation: hm(15, 0),
        });
        let plan = plan_day(&config).unwrap();
        assert_eq!(plan.services[0].kind, ServiceKind::Lunch);
        let (kind, turn) = plan.turn_for(hm(14, 15)).unwrap();
        assert_eq!(kind, ServiceKind::Lunch);
        assert_eq!(turn.name, TurnName::SecondSitting);
        // ceil(50 / 4) = 13
        assert_eq!(turn.per_slot_ceiling, 13);
    }

    #[test]
    fn last_reservation_after_close_is_rejected() {
        let mut config = ServiceDayConfig::fallback(5);
        config.dinner.close = hm(21, 30);
        assert!(matches!(plan_day(&config), Err(CoreError::Validation(_))));

        // A closed day never reads its windows.
        config.is_open = false;
        assert!(plan_day(&config).is_ok());
    }

    #[test]
    fn closed_day_has_no_services() {
        let mut config = ServiceDayConfig::fallback(1);
        config.is_open = false;
        let plan = plan_day(&config).unwrap();
        assert!(plan.services.is_empty());
        assert!(plan.turn_for(hm(20, 0)).is_none());
    }

    #[test]
    fn gap_slot_belongs_to_no_turn() {
        let plan = plan_day(&ServiceDayConfig::fallback(5)).unwrap();
        // first sitting 18:30..=20:00, gap 20:15, second from 20:30
        assert!(plan.turn_for(hm(20, 15)).is_none());
        assert_eq!(plan.turn_for(hm(20, 30)).unwrap().1.name, TurnName::SecondSitting);
        assert!(plan.turn_for(hm(20, 10)).is_none());
    }

    // -- slot_availability --

    #[test]
    fn slot_availability_reports_remaining() {
        let s = slot_availability(hm(20, 0), 6, 8, 2);
        assert!(s.available);
        assert_eq!(s.remaining_capacity, 2);
        assert_eq!(s.utilization_percent, 75);

        let s = slot_availability(hm(20, 0), 7, 8, 2);
        assert!(!s.available);
    }

    #[test]
    fn slot_availability_zero_ceiling() {
        let s = slot_availability(hm(20, 0), 0, 0, 1);
        assert!(!s.available);
        assert_eq!(s.utilization_percent, 0);
    }
}
