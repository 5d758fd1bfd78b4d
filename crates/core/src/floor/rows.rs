use std::collections::BTreeMap;

use crate::table::DiningTable;

/// Maximum distance (in floor units) between a table's Y and a row's
/// running average Y for the table to join that row.
pub const ROW_TOLERANCE: f64 = 20.0;

/// Maximum distance between a table's X and a column's running average X.
pub const COLUMN_TOLERANCE: f64 = 30.0;

/// Cluster tables into rows by approximate Y.
///
/// Single greedy pass in input order: each table joins the first row whose
/// running average Y lies within [`ROW_TOLERANCE`], otherwise it starts a
/// new row. Results depend on input order.
pub fn group_into_rows(tables: &[DiningTable]) -> Vec<Vec<DiningTable>> {
    cluster(tables, ROW_TOLERANCE, |t| t.position_y)
}

/// Cluster tables into columns by approximate X, same greedy rule as rows.
pub fn group_into_columns(tables: &[DiningTable]) -> Vec<Vec<DiningTable>> {
    cluster(tables, COLUMN_TOLERANCE, |t| t.position_x)
}

/// Bucket tables by location tag, zones in sorted order, input order kept
/// within each zone.
pub fn group_by_zone(tables: &[DiningTable]) -> BTreeMap<String, Vec<DiningTable>> {
    let mut zones: BTreeMap<String, Vec<DiningTable>> = BTreeMap::new();
    for table in tables {
        zones
            .entry(table.location.clone())
            .or_default()
            .push(table.clone());
    }
    zones
}

pub(crate) fn average(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

fn cluster(
    tables: &[DiningTable],
    tolerance: f64,
    coord: impl Fn(&DiningTable) -> f64,
) -> Vec<Vec<DiningTable>> {
    let mut groups: Vec<Vec<DiningTable>> = Vec::new();
    for table in tables {
        let value = coord(table);
        let existing = groups.iter_mut().find(|group| {
            let avg = average(group.iter().map(&coord));
            (value - avg).abs() <= tolerance
        });
        match existing {
            Some(group) => group.push(table.clone()),
            None => groups.push(vec![table.clone()]),
        }
    }
    groups
}
