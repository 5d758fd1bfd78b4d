use serde::Serialize;

use super::rows::group_into_rows;
use crate::table::DiningTable;
use crate::types::DbId;

/// Floor positions snap to multiples of this.
pub const GRID_SIZE: f64 = 10.0;
/// Moves of this many units or fewer are not emitted.
pub const MOVE_DEADBAND: f64 = 5.0;
pub const DEFAULT_SPACING: f64 = 60.0;
pub const MIN_SPACING: f64 = 30.0;
pub const MAX_SPACING: f64 = 100.0;
/// Usable floor width assumed when the caller does not give one.
pub const DEFAULT_MAX_WIDTH: f64 = 1500.0;

/// Nearest grid multiple.
pub fn snap_to_grid(value: f64) -> f64 {
    (value / GRID_SIZE).round() * GRID_SIZE
}

/// Smallest grid multiple not below `value`.
fn ceil_to_grid(value: f64) -> f64 {
    (value / GRID_SIZE).ceil() * GRID_SIZE
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionChange {
    pub table_id: DbId,
    pub number: String,
    pub old_x: f64,
    pub new_x: f64,
}

/// Lay a row out left to right with a uniform gap.
///
/// The leftmost table anchors the row. Every following table is placed at
/// `prev_new_x + prev_width + spacing`, snapped to the grid. Only tables
/// that move by more than [`MOVE_DEADBAND`] are returned.
pub fn redistribute_row(row: &[DiningTable], spacing: f64) -> Vec<PositionChange> {
    let mut sorted: Vec<&DiningTable> = row.iter().collect();
    sorted.sort_by(|a, b| {
        a.position_x
            .total_cmp(&b.position_x)
            .then_with(|| a.id.cmp(&b.id))
    });

    let Some(first) = sorted.first() else {
        return Vec::new();
    };

    let mut changes = Vec::new();
    let mut cursor = first.position_x;
    for table in sorted {
        let new_x = snap_to_grid(cursor);
        if (table.position_x - new_x).abs() > MOVE_DEADBAND {
            changes.push(PositionChange {
                table_id: table.id,
                number: table.number.clone(),
                old_x: table.position_x,
                new_x,
            });
        }
        cursor = new_x + table.effective_width() + spacing;
    }
    changes
}

/// Gap that spreads a row evenly across `max_width`.
///
/// Leftover width divided by the number of gaps, snapped down to the grid
/// and clamped to `[MIN_SPACING, MAX_SPACING]`. Rows with fewer than two
/// tables get [`DEFAULT_SPACING`].
///
/// Widths are rounded up to the grid first: [`redistribute_row`] advances
/// by at most `ceil_to_grid(width) + spacing` per table, so an unclamped
/// result keeps the redistributed row within `max_width`.
pub fn optimal_spacing(row: &[DiningTable], max_width: f64) -> f64 {
    let gaps = row.len().saturating_sub(1);
    if gaps == 0 {
        return DEFAULT_SPACING;
    }
    let total_width: f64 = row
        .iter()
        .map(|t| ceil_to_grid(t.effective_width()))
        .sum();
    let raw = (max_width - total_width) / gaps as f64;
    let snapped = (raw / GRID_SIZE).floor() * GRID_SIZE;
    snapped.clamp(MIN_SPACING, MAX_SPACING)
}

/// Optimal spacing for the longest row of a zone's active tables.
pub fn optimal_spacing_for_zone(tables: &[DiningTable], zone: &str, max_width: f64) -> f64 {
    let in_zone: Vec<DiningTable> = tables
        .iter()
        .filter(|t| t.is_active && t.location == zone)
        .cloned()
        .collect();

    let rows = group_into_rows(&in_zone);
    // First row wins on ties.
    let longest = rows
        .iter()
        .fold(None::<&Vec<DiningTable>>, |best, row| match best {
            Some(b) if b.len() >= row.len() => Some(b),
            _ => Some(row),
        });

    match longest {
        Some(row) => optimal_spacing(row, max_width),
        None => DEFAULT_SPACING,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::fixtures::table;

    fn row_at(xs: &[f64]) -> Vec<DiningTable> {
        xs.iter()
            .enumerate()
            .map(|(i, &x)| table(i as i64 + 1, 2, "INTERIOR", x, 100.0))
            .collect()
    }

    fn apply(row: &mut [DiningTable], changes: &[PositionChange]) {
        for c in changes {
            if let Some(t) = row.iter_mut().find(|t| t.id == c.table_id) {
                t.position_x = c.new_x;
            }
        }
    }

    #[test]
    fn three_tables_respaced_at_sixty() {
        let row = row_at(&[0.0, 100.0, 250.0]);
        let changes = redistribute_row(&row, 60.0);
        let moved: Vec<_> = changes.iter().map(|c| (c.table_id, c.old_x, c.new_x)).collect();
        assert_eq!(moved, vec![(2, 100.0, 140.0), (3, 250.0, 280.0)]);
    }

    #[test]
    fn redistribute_is_a_fixed_point() {
        let mut row = row_at(&[3.0, 97.0, 410.0, 260.0]);
        row[1].width = 120.0;
        row[2].width = 0.0;

        let first = redistribute_row(&row, 45.0);
        assert!(!first.is_empty());
        apply(&mut row, &first);
        assert!(redistribute_row(&row, 45.0).is_empty());
    }

    #[test]
    fn small_moves_are_suppressed() {
        // 0 -> 0, 144 -> 140 is within the deadband
        let row = row_at(&[0.0, 144.0]);
        assert!(redistribute_row(&row, 60.0).is_empty());
    }

    #[test]
    fn empty_row_has_no_changes() {
        assert!(redistribute_row(&[], 60.0).is_empty());
    }

    #[test]
    fn ties_on_x_ordered_by_id() {
        let mut row = row_at(&[50.0, 50.0]);
        row.swap(0, 1);
        let changes = redistribute_row(&row, 60.0);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].table_id, 2);
        assert_eq!(changes[0].new_x, 190.0);
    }

    #[test]
    fn optimal_spacing_clamps() {
        let row = row_at(&[0.0, 100.0, 200.0]);
        // (1500 - 240) / 2 = 630 -> 100
        assert_eq!(optimal_spacing(&row, 1500.0), MAX_SPACING);
        // (300 - 240) / 2 = 30
        assert_eq!(optimal_spacing(&row, 300.0), 30.0);
        // negative leftover -> 30
        assert_eq!(optimal_spacing(&row, 100.0), MIN_SPACING);
    }

    #[test]
    fn optimal_spacing_snaps_down() {
        let row = row_at(&[0.0, 100.0, 200.0]);
        // (350 - 240) / 2 = 55 -> 50
        assert_eq!(optimal_spacing(&row, 350.0), 50.0);
    }

    #[test]
    fn single_table_uses_default() {
        assert_eq!(optimal_spacing(&row_at(&[0.0]), 500.0), DEFAULT_SPACING);
        assert_eq!(optimal_spacing(&[], 500.0), DEFAULT_SPACING);
    }

    #[test]
    fn spacing_round_trip_fits_max_width() {
        for max_width in [340.0, 365.0, 400.0, 480.0, 520.0] {
            let mut row = row_at(&[0.0, 90.0, 200.0, 330.0]);
            let spacing = optimal_spacing(&row, max_width);
            let raw = (max_width - 320.0) / 3.0;
            if !(MIN_SPACING..=MAX_SPACING).contains(&raw) {
                continue;
            }
            let changes = redistribute_row(&row, spacing);
            apply(&mut row, &changes);
            let left = row.iter().map(|t| t.position_x).fold(f64::MAX, f64::min);
            let right = row
                .iter()
                .map(|t| t.position_x + t.effective_width())
                .fold(f64::MIN, f64::max);
            assert!(right - left <= max_width, "max_width {max_width}");
        }
    }

    #[test]
    fn round_trip_fits_with_off_grid_widths() {
        let mut row = row_at(&[0.0, 100.0, 250.0]);
        for t in &mut row {
            t.width = 85.0;
        }
        // widths count as 90 each: (375 - 270) / 2 = 52.5 -> 50
        let spacing = optimal_spacing(&row, 375.0);
        assert_eq!(spacing, 50.0);

        let changes = redistribute_row(&row, spacing);
        apply(&mut row, &changes);
        let xs: Vec<f64> = row.iter().map(|t| t.position_x).collect();
        assert_eq!(xs, vec![0.0, 140.0, 280.0]);
        let span = row.last().unwrap().position_x + 85.0 - row[0].position_x;
        assert!(span <= 375.0, "span {span}");
    }

    #[test]
    fn round_trip_fits_for_mixed_widths() {
        let widths = [85.0, 72.0, 121.0, 80.0, 99.0];
        for max_width in [560.0, 600.0, 633.0, 700.0, 777.0] {
            let mut row = row_at(&[0.0, 60.0, 170.0, 330.0, 420.0]);
            for (t, w) in row.iter_mut().zip(widths) {
                t.width = w;
            }
            let spacing = optimal_spacing(&row, max_width);
            // 90 + 80 + 130 + 80 + 100 = 480 on the grid
            let raw = (max_width - 480.0) / 4.0;
            if !(MIN_SPACING..=MAX_SPACING).contains(&raw) {
                continue;
            }
            let changes = redistribute_row(&row, spacing);
            apply(&mut row, &changes);
            let left = row.iter().map(|t| t.position_x).fold(f64::MAX, f64::min);
            let right = row
                .iter()
                .map(|t| t.position_x + t.effective_width())
                .fold(f64::MIN, f64::max);
            assert!(right - left <= max_width, "max_width {max_width}: span {}", right - left);
        }
    }

    #[test]
    fn zone_spacing_uses_longest_row() {
        let mut tables = row_at(&[0.0, 100.0, 200.0]);
        tables.push(table(10, 2, "INTERIOR", 0.0, 400.0));
        tables.push(table(11, 2, "TERRACE", 0.0, 100.0));
        // longest INTERIOR row: 3 tables, (400 - 240) / 2 = 80
        assert_eq!(optimal_spacing_for_zone(&tables, "INTERIOR", 400.0), 80.0);
        assert_eq!(optimal_spacing_for_zone(&tables, "TERRACE", 400.0), DEFAULT_SPACING);
        assert_eq!(optimal_spacing_for_zone(&tables, "SALA_VIP", 400.0), DEFAULT_SPACING);
    }
}
