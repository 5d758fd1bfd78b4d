//! Dining table row model.

use serde::Serialize;
use sqlx::FromRow;
use tablebook_core::table::DiningTable;
use tablebook_core::types::{DbId, Timestamp};

/// A row from the `dining_tables` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TableRow {
    pub id: DbId,
    pub number: String,
    pub capacity: i32,
    pub location: String,
    pub is_active: bool,
    pub position_x: f64,
    pub position_y: f64,
    pub width: f64,
    pub height: f64,
    pub rotation: f64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<TableRow> for DiningTable {
    fn from(row: TableRow) -> Self {
        DiningTable {
            id: row.id,
            number: row.number,
            capacity: row.capacity,
            location: row.location,
            is_active: row.is_active,
            position_x: row.position_x,
            position_y: row.position_y,
            width: row.width,
            height: row.height,
            rotation: row.rotation,
        }
    }
}
