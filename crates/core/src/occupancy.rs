//! Daily occupancy against per-weekday ceilings.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::Serialize;

use crate::booking::day_of_week;
use crate::error::CoreError;
use crate::store::{DailyAggregate, ReservationStore};

/// Ceiling used for weekdays without a configured value.
pub const DEFAULT_OCCUPANCY_CEILING: i32 = 100;
/// Longest report, in days (inclusive of both ends).
pub const MAX_RANGE_DAYS: i64 = 366;

/// `round(total / ceiling * 100)`, capped at 100. Zero guests or a
/// non-positive ceiling read as 0.
pub fn occupancy_percentage(total_party_size: i64, ceiling: i32) -> i32 {
    if total_party_size <= 0 || ceiling <= 0 {
        return 0;
    }
    let pct = (total_party_size as f64 / f64::from(ceiling) * 100.0).round();
    pct.min(100.0) as i32
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OccupancySample {
    pub date: NaiveDate,
    pub day_of_week: u32,
    pub count: i64,
    pub total_party_size: i64,
    pub ceiling: i32,
    pub percentage: i32,
    /// More guests than the ceiling. The percentage is capped; this is not.
    pub overbooked: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OccupancyReport {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_reservations: i64,
    pub total_guests: i64,
    pub days: Vec<OccupancySample>,
}

pub fn validate_range(start: NaiveDate, end: NaiveDate) -> Result<(), CoreError> {
    if start > end {
        return Err(CoreError::Validation(format!(
            "start_date {start} is after end_date {end}"
        )));
    }
    let days = (end - start).num_days() + 1;
    if days > MAX_RANGE_DAYS {
        return Err(CoreError::Validation(format!(
            "Range covers {days} days, at most {MAX_RANGE_DAYS} allowed"
        )));
    }
    Ok(())
}

/// One sample per calendar day in `start..=end`; days missing from
/// `aggregates` report zero.
pub fn build_report(
    start: NaiveDate,
    end: NaiveDate,
    aggregates: &[DailyAggregate],
    ceilings: &BTreeMap<u32, i32>,
) -> Result<OccupancyReport, CoreError> {
    validate_range(start, end)?;

    let by_date: HashMap<NaiveDate, &DailyAggregate> =
        aggregates.iter().map(|a| (a.date, a)).collect();

    let days: Vec<OccupancySample> = start
        .iter_days()
        .take_while(|d| *d <= end)
        .map(|date| {
            let dow = day_of_week(date);
            let ceiling = ceilings
                .get(&dow)
                .copied()
                .unwrap_or(DEFAULT_OCCUPANCY_CEILING);
            let (count, total_party_size) = by_date
                .get(&date)
                .map_or((0, 0), |a| (a.count, a.total_party_size));
            OccupancySample {
                date,
                day_of_week: dow,
                count,
                total_party_size,
                ceiling,
                percentage: occupancy_percentage(total_party_size, ceiling),
                overbooked: ceiling > 0 && total_party_size > i64::from(ceiling),
            }
        })
        .collect();

    Ok(OccupancyReport {
        start_date: start,
        end_date: end,
        total_reservations: days.iter().map(|d| d.count).sum(),
        total_guests: days.iter().map(|d| d.total_party_size).sum(),
        days,
    })
}

pub async fn occupancy_for_range(
    store: &dyn ReservationStore,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<OccupancyReport, CoreError> {
    validate_range(start, end)?;
    let aggregates = store.daily_aggregates(start, end).await?;
    let ceilings = store.occupancy_ceilings().await?;
    let report = build_report(start, end, &aggregates, &ceilings)?;

    let overbooked = report.days.iter().filter(|d| d.overbooked).count();
    if overbooked > 0 {
        tracing::warn!(%start, %end, overbooked, "Overbooked days in occupancy range");
    }
    Ok(report)
}
