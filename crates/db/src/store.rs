//! Postgres implementation of the core's `ReservationStore`.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use tablebook_core::capacity::ServiceDayConfig;
use tablebook_core::reservation::{BookedReservation, NewReservation, ReservationStatus};
use tablebook_core::store::{check_commit, CommitGuard, DailyAggregate, ReservationStore, StoreError};
use tablebook_core::table::DiningTable;
use tablebook_core::types::DbId;

use crate::repositories::{BusinessHoursRepo, ReservationRepo, TableRepo};
use crate::DbPool;

/// Map a sqlx error onto the store taxonomy.
///
/// - Unique violations (`23505`) and serialization failures (`40001`,
///   `40P01`) are conflicts.
/// - Foreign-key and check violations are invalid data.
/// - Everything else, including pool timeouts and I/O, is unavailability.
pub fn classify(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        match db_err.code().as_deref() {
            Some("23505") | Some("40001") | Some("40P01") => {
                return StoreError::Conflict(db_err.message().to_string());
            }
            Some("23503") | Some("23514") | Some("22P02") => {
                return StoreError::Invalid(db_err.message().to_string());
            }
            _ => {}
        }
    }
    tracing::error!(error = %err, "Database error");
    StoreError::Unavailable(err.to_string())
}

fn decode_booked(
    rows: Vec<crate::models::reservation::BookedRow>,
) -> Result<Vec<BookedReservation>, StoreError> {
    rows.into_iter()
        .map(|row| BookedReservation::try_from(row).map_err(|e| StoreError::Invalid(e.to_string())))
        .collect()
}

pub struct PgReservationStore {
    pool: DbPool,
}

impl PgReservationStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl ReservationStore for PgReservationStore {
    async fn list_tables(&self) -> Result<Vec<DiningTable>, StoreError> {
        let rows = TableRepo::list_all(&self.pool).await.map_err(classify)?;
        Ok(rows.into_iter().map(DiningTable::from).collect())
    }

    async fn list_reservations(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<BookedReservation>, StoreError> {
        let rows = ReservationRepo::list_booked_for_date(&self.pool, date)
            .await
            .map_err(classify)?;
        decode_booked(rows)
    }

    async fn get_reservation(&self, id: DbId) -> Result<Option<BookedReservation>, StoreError> {
        let row = ReservationRepo::find_booked(&self.pool, id)
            .await
            .map_err(classify)?;
        Ok(decode_booked(row.into_iter().collect())?.pop())
    }

    async fn service_config(
        &self,
        day_of_week: u32,
    ) -> Result<Option<ServiceDayConfig>, StoreError> {
        let row = BusinessHoursRepo::find_by_day(&self.pool, day_of_week as i16)
            .await
            .map_err(classify)?;
        Ok(row.map(ServiceDayConfig::from))
    }

    async fn occupancy_ceilings(&self) -> Result<BTreeMap<u32, i32>, StoreError> {
        let rows = BusinessHoursRepo::list_all(&self.pool)
            .await
            .map_err(classify)?;
        Ok(rows
            .into_iter()
            .map(|row| (row.day_of_week as u32, row.max_capacity))
            .collect())
    }

    async fn daily_aggregates(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyAggregate>, StoreError> {
        let rows = ReservationRepo::daily_aggregates(&self.pool, start, end)
            .await
            .map_err(classify)?;
        Ok(rows
            .into_iter()
            .map(|row| DailyAggregate {
                date: row.reservation_date,
                count: row.count,
                total_party_size: row.total_party_size,
            })
            .collect())
    }

    async fn update_table_position(&self, id: DbId, x: f64, y: f64) -> Result<(), StoreError> {
        let updated = TableRepo::update_position(&self.pool, id, x, y)
            .await
            .map_err(classify)?;
        if !updated {
            return Err(StoreError::NotFound { entity: "table", id });
        }
        Ok(())
    }

    async fn update_table_dimensions(
        &self,
        id: DbId,
        width: f64,
        height: f64,
    ) -> Result<(), StoreError> {
        let updated = TableRepo::update_dimensions(&self.pool, id, width, height)
            .await
            .map_err(classify)?;
        if !updated {
            return Err(StoreError::NotFound { entity: "table", id });
        }
        Ok(())
    }

    async fn create_reservation(
        &self,
        reservation: &NewReservation,
        guard: &CommitGuard,
    ) -> Result<DbId, StoreError> {
        let mut table_ids = reservation.table_ids.clone();
        table_ids.sort_unstable();
        table_ids.dedup();

        let mut tx = self.pool.begin().await.map_err(classify)?;

        // Slot lock first, then table rows in id order.
        ReservationRepo::lock_slot(&mut tx, reservation.date, reservation.time)
            .await
            .map_err(classify)?;
        let locked: Vec<DiningTable> = TableRepo::lock_for_update(&mut tx, &table_ids)
            .await
            .map_err(classify)?
            .into_iter()
            .map(DiningTable::from)
            .collect();
        let same_day = decode_booked(
            ReservationRepo::list_booked_for_date(&mut *tx, reservation.date)
                .await
                .map_err(classify)?,
        )?;

        check_commit(reservation, guard, &locked, &same_day)?;

        let row = ReservationRepo::insert(&mut tx, reservation)
            .await
            .map_err(classify)?;
        tx.commit().await.map_err(classify)?;

        tracing::debug!(reservation_id = row.id, tables = ?table_ids, "Reservation inserted");
        Ok(row.id)
    }

    async fn update_reservation_status(
        &self,
        id: DbId,
        from: ReservationStatus,
        to: ReservationStatus,
    ) -> Result<(), StoreError> {
        let updated = ReservationRepo::update_status(&self.pool, id, from, to)
            .await
            .map_err(classify)?;
        if updated {
            return Ok(());
        }
        // Nothing matched: either the row is gone or its status moved on.
        match ReservationRepo::find_booked(&self.pool, id)
            .await
            .map_err(classify)?
        {
            None => Err(StoreError::NotFound {
                entity: "reservation",
                id,
            }),
            Some(_) => Err(StoreError::Conflict(format!(
                "Reservation {id} is no longer {}",
                from.as_str()
            ))),
        }
    }

    async fn ping(&self) -> Result<(), StoreError> {
        crate::health_check(&self.pool).await.map_err(classify)
    }
}
