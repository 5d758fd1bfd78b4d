//! Per-weekday service configuration row.

use chrono::NaiveTime;
use sqlx::FromRow;
use tablebook_core::capacity::{ServiceDayConfig, ServiceWindow};

/// A row from the `business_hours` table.
#[derive(Debug, Clone, FromRow)]
pub struct BusinessHours {
    pub day_of_week: i16,
    pub is_open: bool,
    pub total_capacity: i32,
    pub target_occupancy: f64,
    pub slot_minutes: i32,
    pub lunch_enabled: bool,
    pub lunch_open: Option<NaiveTime>,
    pub lunch_close: Option<NaiveTime>,
    pub lunch_last_reservation: Option<NaiveTime>,
    pub dinner_open: NaiveTime,
    pub dinner_close: NaiveTime,
    pub dinner_last_reservation: NaiveTime,
    pub max_capacity: i32,
}

impl BusinessHours {
    pub fn lunch_window(&self) -> Option<ServiceWindow> {
        if !self.lunch_enabled {
            return None;
        }
        Some(ServiceWindow {
            open: self.lunch_open?,
            close: self.lunch_close?,
            last_reservation: self.lunch_last_reservation?,
        })
    }
}

impl From<BusinessHours> for ServiceDayConfig {
    fn from(row: BusinessHours) -> Self {
        ServiceDayConfig {
            day_of_week: row.day_of_week as u32,
            is_open: row.is_open,
            total_capacity: row.total_capacity,
            target_occupancy: row.target_occupancy,
            slot_minutes: i64::from(row.slot_minutes),
            lunch: row.lunch_window(),
            dinner: ServiceWindow {
                open: row.dinner_open,
                close: row.dinner_close,
                last_reservation: row.dinner_last_reservation,
            },
        }
    }
}
