//! Reservation row models.

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use sqlx::FromRow;
use tablebook_core::error::CoreError;
use tablebook_core::reservation::{BookedReservation, ReservationStatus};
use tablebook_core::types::{DbId, Timestamp};

/// A row from the `reservations` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Reservation {
    pub id: DbId,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub reservation_date: NaiveDate,
    pub reservation_time: NaiveTime,
    pub party_size: i32,
    pub status: String,
    pub origin: String,
    pub consent_data_processing: bool,
    pub consent_email: bool,
    pub consent_marketing: bool,
    pub special_requests: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A reservation joined with its assigned table ids.
#[derive(Debug, Clone, FromRow)]
pub struct BookedRow {
    pub id: DbId,
    pub reservation_date: NaiveDate,
    pub reservation_time: NaiveTime,
    pub party_size: i32,
    pub status: String,
    pub table_ids: Vec<DbId>,
}

impl TryFrom<BookedRow> for BookedReservation {
    type Error = CoreError;

    fn try_from(row: BookedRow) -> Result<Self, Self::Error> {
        Ok(BookedReservation {
            id: row.id,
            date: row.reservation_date,
            time: row.reservation_time,
            party_size: row.party_size,
            status: ReservationStatus::parse(&row.status)?,
            table_ids: row.table_ids,
        })
    }
}

/// Per-day aggregate of non-cancelled reservations.
#[derive(Debug, Clone, FromRow)]
pub struct DailyAggregateRow {
    pub reservation_date: NaiveDate,
    pub count: i64,
    pub total_party_size: i64,
}
