use std::collections::HashMap;

use serde::Serialize;

use super::rows::{average, group_into_columns, group_into_rows};
use super::spacing::{snap_to_grid, MOVE_DEADBAND};
use crate::table::DiningTable;
use crate::types::DbId;

/// Footprint for a table of the given capacity: up to 2 seats 80x80, up to
/// 4 seats 120x80, larger 160x80.
pub fn standard_dimensions(capacity: i32) -> (f64, f64) {
    match capacity {
        c if c <= 2 => (80.0, 80.0),
        c if c <= 4 => (120.0, 80.0),
        _ => (160.0, 80.0),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DimensionFix {
    pub table_id: DbId,
    pub number: String,
    pub capacity: i32,
    pub old_width: f64,
    pub old_height: f64,
    pub new_width: f64,
    pub new_height: f64,
}

/// Tables whose stored size differs from the standard for their capacity.
pub fn dimension_fixes(tables: &[DiningTable]) -> Vec<DimensionFix> {
    tables
        .iter()
        .filter_map(|t| {
            let (width, height) = standard_dimensions(t.capacity);
            (t.width != width || t.height != height).then(|| DimensionFix {
                table_id: t.id,
                number: t.number.clone(),
                capacity: t.capacity,
                old_width: t.width,
                old_height: t.height,
                new_width: width,
                new_height: height,
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignmentChange {
    pub table_id: DbId,
    pub number: String,
    pub old_x: f64,
    pub old_y: f64,
    pub new_x: f64,
    pub new_y: f64,
}

/// Grid-align one zone.
///
/// Rows share their snapped average Y and every X snaps to the grid. Then
/// columns of two or more tables pull their members onto the column's
/// snapped average X when they sit more than [`MOVE_DEADBAND`] away from
/// it. Returned in input order, unchanged tables omitted.
pub fn align_rows(tables: &[DiningTable]) -> Vec<AlignmentChange> {
    let mut target: HashMap<DbId, (f64, f64)> = HashMap::with_capacity(tables.len());

    for row in group_into_rows(tables) {
        let y = snap_to_grid(average(row.iter().map(|t| t.position_y)));
        for t in &row {
            target.insert(t.id, (snap_to_grid(t.position_x), y));
        }
    }

    for column in group_into_columns(tables) {
        if column.len() < 2 {
            continue;
        }
        let x = snap_to_grid(average(column.iter().map(|t| t.position_x)));
        for t in &column {
            if (t.position_x - x).abs() > MOVE_DEADBAND {
                if let Some(pos) = target.get_mut(&t.id) {
                    pos.0 = x;
                }
            }
        }
    }

    tables
        .iter()
        .filter_map(|t| {
            let (new_x, new_y) = *target.get(&t.id)?;
            (new_x != t.position_x || new_y != t.position_y).then(|| AlignmentChange {
                table_id: t.id,
                number: t.number.clone(),
                old_x: t.position_x,
                old_y: t.position_y,
                new_x,
                new_y,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::fixtures::table;

    #[test]
    fn standard_sizes_by_capacity() {
        assert_eq!(standard_dimensions(1), (80.0, 80.0));
        assert_eq!(standard_dimensions(2), (80.0, 80.0));
        assert_eq!(standard_dimensions(3), (120.0, 80.0));
        assert_eq!(standard_dimensions(4), (120.0, 80.0));
        assert_eq!(standard_dimensions(6), (160.0, 80.0));
        assert_eq!(standard_dimensions(12), (160.0, 80.0));
    }

    #[test]
    fn only_nonstandard_tables_are_fixed() {
        let mut four = table(2, 4, "INTERIOR", 0.0, 0.0);
        four.width = 80.0;
        let tables = vec![table(1, 2, "INTERIOR", 0.0, 0.0), four];
        let fixes = dimension_fixes(&tables);
        assert_eq!(fixes.len(), 1);
        assert_eq!(fixes[0].table_id, 2);
        assert_eq!((fixes[0].new_width, fixes[0].new_height), (120.0, 80.0));
    }

    #[test]
    fn row_snaps_to_average_y() {
        let tables = vec![
            table(1, 2, "INTERIOR", 0.0, 100.0),
            table(2, 2, "INTERIOR", 200.0, 112.0),
        ];
        let changes = align_rows(&tables);
        // avg 106 -> 110
        assert_eq!(changes.len(), 2);
        assert!(changes.iter().all(|c| c.new_y == 110.0));
        assert_eq!(changes[1].new_x, 200.0);
    }

    #[test]
    fn aligned_tables_are_untouched() {
        let tables = vec![
            table(1, 2, "INTERIOR", 0.0, 100.0),
            table(2, 2, "INTERIOR", 200.0, 100.0),
        ];
        assert!(align_rows(&tables).is_empty());
    }

    #[test]
    fn column_pulls_members_to_common_x() {
        let tables = vec![
            table(1, 2, "TERRACE", 100.0, 0.0),
            table(2, 2, "TERRACE", 120.0, 200.0),
        ];
        // column avg 110; both are 10 away
        let changes = align_rows(&tables);
        assert_eq!(changes.len(), 2);
        assert!(changes.iter().all(|c| c.new_x == 110.0));
        assert_eq!(changes[0].new_y, 0.0);
        assert_eq!(changes[1].new_y, 200.0);
    }
}
