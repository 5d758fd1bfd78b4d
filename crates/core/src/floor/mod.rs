//! Floor-plan layout normalization.
//!
//! The pure pieces ([`rows`], [`spacing`], [`dimensions`]) compute proposed
//! changes. The async functions here load the floor from the store, apply
//! the changes one table at a time and report what was skipped. Batches run
//! sequentially because each row's positions derive from its neighbours.

pub mod dimensions;
pub mod rows;
pub mod spacing;

use std::collections::HashMap;

use serde::Serialize;

use crate::error::CoreError;
use crate::store::ReservationStore;
use crate::table::{validate_dimensions, validate_position, DiningTable};
use crate::types::DbId;

pub use dimensions::{align_rows, dimension_fixes, standard_dimensions, AlignmentChange, DimensionFix};
pub use rows::{group_by_zone, group_into_rows, ROW_TOLERANCE};
pub use spacing::{
    optimal_spacing, optimal_spacing_for_zone, redistribute_row, snap_to_grid, PositionChange,
    DEFAULT_MAX_WIDTH, DEFAULT_SPACING,
};

// ---------------------------------------------------------------------------
// Batch summary
// ---------------------------------------------------------------------------

/// A table whose update failed during a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedTable {
    pub table_id: DbId,
    pub number: String,
    pub reason: String,
}

/// Outcome of a floor-wide batch: changes written and tables skipped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FloorBatch<T> {
    pub applied: Vec<T>,
    pub skipped: Vec<SkippedTable>,
}

impl<T> Default for FloorBatch<T> {
    fn default() -> Self {
        Self {
            applied: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

impl<T> FloorBatch<T> {
    fn record<E: std::fmt::Display>(
        &mut self,
        change: T,
        table_id: DbId,
        number: &str,
        result: Result<(), E>,
    ) {
        match result {
            Ok(()) => self.applied.push(change),
            Err(e) => {
                tracing::warn!(table_id, number, error = %e, "Floor update failed, skipping table");
                self.skipped.push(SkippedTable {
                    table_id,
                    number: number.to_string(),
                    reason: e.to_string(),
                });
            }
        }
    }
}

fn active(tables: Vec<DiningTable>) -> Vec<DiningTable> {
    tables.into_iter().filter(|t| t.is_active).collect()
}

/// Position writes never leave the non-negative quadrant.
async fn write_position(
    store: &dyn ReservationStore,
    id: DbId,
    x: f64,
    y: f64,
) -> Result<(), CoreError> {
    validate_position(x, y)?;
    store.update_table_position(id, x, y).await?;
    Ok(())
}

async fn write_dimensions(
    store: &dyn ReservationStore,
    id: DbId,
    width: f64,
    height: f64,
) -> Result<(), CoreError> {
    validate_dimensions(width, height)?;
    store.update_table_dimensions(id, width, height).await?;
    Ok(())
}

fn validate_spacing(spacing: f64) -> Result<(), CoreError> {
    if !spacing.is_finite() || spacing < 0.0 {
        return Err(CoreError::Validation(format!(
            "spacing must be a non-negative number, got {spacing}"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Store-driven operations
// ---------------------------------------------------------------------------

/// Re-space every row of every zone with a uniform gap.
pub async fn redistribute_floor(
    store: &dyn ReservationStore,
    spacing: f64,
) -> Result<FloorBatch<PositionChange>, CoreError> {
    validate_spacing(spacing)?;
    let tables = active(store.list_tables().await?);
    let y_by_id: HashMap<DbId, f64> = tables.iter().map(|t| (t.id, t.position_y)).collect();

    let mut batch = FloorBatch::default();
    for (zone, zone_tables) in group_by_zone(&tables) {
        let rows = group_into_rows(&zone_tables);
        tracing::debug!(zone = %zone, rows = rows.len(), "Redistributing zone");
        for row in rows {
            for change in redistribute_row(&row, spacing) {
                let y = y_by_id.get(&change.table_id).copied().unwrap_or_default();
                let result = write_position(store, change.table_id, change.new_x, y).await;
                let (id, number) = (change.table_id, change.number.clone());
                batch.record(change, id, &number, result);
            }
        }
    }

    tracing::info!(
        spacing,
        updated = batch.applied.len(),
        skipped = batch.skipped.len(),
        "Floor redistributed",
    );
    Ok(batch)
}

/// Spacing that fits the longest row of `zone` into `max_width`.
pub async fn zone_spacing(
    store: &dyn ReservationStore,
    zone: &str,
    max_width: f64,
) -> Result<f64, CoreError> {
    if !max_width.is_finite() || max_width <= 0.0 {
        return Err(CoreError::Validation(format!(
            "max_width must be a positive number, got {max_width}"
        )));
    }
    let tables = store.list_tables().await?;
    Ok(optimal_spacing_for_zone(&tables, zone, max_width))
}

/// Grid-align rows and columns zone by zone.
pub async fn align_floor(
    store: &dyn ReservationStore,
) -> Result<FloorBatch<AlignmentChange>, CoreError> {
    let tables = active(store.list_tables().await?);

    let mut batch = FloorBatch::default();
    for zone_tables in group_by_zone(&tables).into_values() {
        for change in align_rows(&zone_tables) {
            let result =
                write_position(store, change.table_id, change.new_x, change.new_y).await;
            let (id, number) = (change.table_id, change.number.clone());
            batch.record(change, id, &number, result);
        }
    }

    tracing::info!(
        aligned = batch.applied.len(),
        skipped = batch.skipped.len(),
        "Floor aligned",
    );
    Ok(batch)
}

/// Reset every table, active or not, to the standard size for its capacity.
pub async fn fix_floor_dimensions(
    store: &dyn ReservationStore,
) -> Result<FloorBatch<DimensionFix>, CoreError> {
    let tables = store.list_tables().await?;

    let mut batch = FloorBatch::default();
    for fix in dimension_fixes(&tables) {
        let result = write_dimensions(store, fix.table_id, fix.new_width, fix.new_height).await;
        let (id, number) = (fix.table_id, fix.number.clone());
        batch.record(fix, id, &number, result);
    }

    tracing::info!(
        updated = batch.applied.len(),
        skipped = batch.skipped.len(),
        "Table dimensions fixed",
    );
    Ok(batch)
}
