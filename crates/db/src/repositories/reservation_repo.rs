//! Repository for `reservations` and `reservation_tables`.

use chrono::{NaiveDate, NaiveTime};
use sqlx::{PgConnection, PgExecutor, PgPool};
use tablebook_core::reservation::{NewReservation, ReservationStatus};
use tablebook_core::types::DbId;

use crate::models::reservation::{BookedRow, DailyAggregateRow, Reservation};

/// Column list for `reservations` queries.
const COLUMNS: &str = "\
    id, customer_name, customer_email, customer_phone, \
    reservation_date, reservation_time, party_size, status, origin, \
    consent_data_processing, consent_email, consent_marketing, \
    special_requests, created_at, updated_at";

/// Reservation columns plus the aggregated table assignment.
const BOOKED_SELECT: &str = "\
    SELECT r.id, r.reservation_date, r.reservation_time, r.party_size, r.status, \
           COALESCE( \
               array_agg(rt.table_id ORDER BY rt.table_id) FILTER (WHERE rt.table_id IS NOT NULL), \
               '{}'::BIGINT[] \
           ) AS table_ids \
    FROM reservations r \
    LEFT JOIN reservation_tables rt ON rt.reservation_id = r.id";

pub struct ReservationRepo;

impl ReservationRepo {
    /// All reservations on `date`, any status, with their tables.
    pub async fn list_booked_for_date<'e, E>(
        executor: E,
        date: NaiveDate,
    ) -> Result<Vec<BookedRow>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "{BOOKED_SELECT} WHERE r.reservation_date = $1 \
             GROUP BY r.id ORDER BY r.reservation_time, r.id"
        );
        sqlx::query_as::<_, BookedRow>(&query)
            .bind(date)
            .fetch_all(executor)
            .await
    }

    pub async fn find_booked(pool: &PgPool, id: DbId) -> Result<Option<BookedRow>, sqlx::Error> {
        let query = format!("{BOOKED_SELECT} WHERE r.id = $1 GROUP BY r.id");
        sqlx::query_as::<_, BookedRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Insert the reservation row and its table links.
    pub async fn insert(
        conn: &mut PgConnection,
        input: &NewReservation,
    ) -> Result<Reservation, sqlx::Error> {
        let query = format!(
            "INSERT INTO reservations \
                (customer_name, customer_email, customer_phone, \
                 reservation_date, reservation_time, party_size, status, origin, \
                 consent_data_processing, consent_email, consent_marketing, special_requests) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             RETURNING {COLUMNS}"
        );
        let reservation = sqlx::query_as::<_, Reservation>(&query)
            .bind(&input.customer_name)
            .bind(&input.customer_email)
            .bind(&input.customer_phone)
            .bind(input.date)
            .bind(input.time)
            .bind(input.party_size)
            .bind(input.status.as_str())
            .bind(input.origin.as_str())
            .bind(input.consent.data_processing)
            .bind(input.consent.email)
            .bind(input.consent.marketing)
            .bind(&input.special_requests)
            .fetch_one(&mut *conn)
            .await?;

        sqlx::query(
            "INSERT INTO reservation_tables (reservation_id, table_id) \
             SELECT $1, UNNEST($2::BIGINT[])",
        )
        .bind(reservation.id)
        .bind(&input.table_ids)
        .execute(&mut *conn)
        .await?;

        Ok(reservation)
    }

    /// Move the status from `from` to `to`. Returns `false` when the row is
    /// missing or no longer in `from`.
    pub async fn update_status(
        pool: &PgPool,
        id: DbId,
        from: ReservationStatus,
        to: ReservationStatus,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE reservations SET status = $2, updated_at = now() \
             WHERE id = $1 AND status = $3",
        )
        .bind(id)
        .bind(to.as_str())
        .bind(from.as_str())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Count and guest total of non-cancelled reservations per day.
    pub async fn daily_aggregates(
        pool: &PgPool,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyAggregateRow>, sqlx::Error> {
        sqlx::query_as::<_, DailyAggregateRow>(
            "SELECT reservation_date, \
                    COUNT(*) AS count, \
                    COALESCE(SUM(party_size), 0)::BIGINT AS total_party_size \
             FROM reservations \
             WHERE reservation_date BETWEEN $1 AND $2 AND status <> 'cancelled' \
             GROUP BY reservation_date \
             ORDER BY reservation_date",
        )
        .bind(start)
        .bind(end)
        .fetch_all(pool)
        .await
    }

    /// Serialize writers for one slot until the transaction ends.
    pub async fn lock_slot(
        conn: &mut PgConnection,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(format!("slot:{date}T{time}"))
            .execute(conn)
            .await?;
        Ok(())
    }
}
