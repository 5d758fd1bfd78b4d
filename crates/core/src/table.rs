//! Dining table domain type and its invariants.
//!
//! Tables are owned by the reservation store. The core only reads them and
//! proposes position/size changes; tables are soft-deactivated, never
//! removed, so reservation history keeps resolving.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

/// Width assumed for a table whose stored width is missing or zero.
pub const DEFAULT_TABLE_WIDTH: f64 = 80.0;

/// A physical table on the floor plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiningTable {
    pub id: DbId,
    /// Human-facing label painted on the table ("T12", "VIP-2").
    pub number: String,
    pub capacity: i32,
    /// Zone tag (e.g. `TERRACE`, `SALA_PRINCIPAL`). Tables are only combined
    /// within one zone.
    pub location: String,
    pub is_active: bool,
    pub position_x: f64,
    pub position_y: f64,
    pub width: f64,
    pub height: f64,
    pub rotation: f64,
}

impl DiningTable {
    /// Width used for layout arithmetic.
    pub fn effective_width(&self) -> f64 {
        if self.width > 0.0 {
            self.width
        } else {
            DEFAULT_TABLE_WIDTH
        }
    }
}

/// Positions are finite and non-negative.
pub fn validate_position(x: f64, y: f64) -> Result<(), CoreError> {
    validate_non_negative(&[("position_x", x), ("position_y", y)])
}

/// Sizes are finite and non-negative.
pub fn validate_dimensions(width: f64, height: f64) -> Result<(), CoreError> {
    validate_non_negative(&[("width", width), ("height", height)])
}

fn validate_non_negative(fields: &[(&str, f64)]) -> Result<(), CoreError> {
    for &(name, value) in fields {
        if !value.is_finite() || value < 0.0 {
            return Err(CoreError::Validation(format!(
                "{name} must be a non-negative number, got {value}"
            )));
        }
    }
    Ok(())
}
