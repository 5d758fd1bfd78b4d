//! Repository for the `dining_tables` table.

use sqlx::{PgConnection, PgPool};
use tablebook_core::types::DbId;

use crate::models::table::TableRow;

/// Column list for `dining_tables` queries.
const COLUMNS: &str = "\
    id, number, capacity, location, is_active, \
    position_x, position_y, width, height, rotation, created_at, updated_at";

pub struct TableRepo;

impl TableRepo {
    /// Every table, active or not, ordered by id.
    pub async fn list_all(pool: &PgPool) -> Result<Vec<TableRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM dining_tables ORDER BY id");
        sqlx::query_as::<_, TableRow>(&query).fetch_all(pool).await
    }

    /// Lock the given tables for the rest of the transaction.
    ///
    /// Rows are locked in id order so concurrent bookings of overlapping
    /// table sets cannot deadlock.
    pub async fn lock_for_update(
        conn: &mut PgConnection,
        ids: &[DbId],
    ) -> Result<Vec<TableRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM dining_tables WHERE id = ANY($1) ORDER BY id FOR UPDATE"
        );
        sqlx::query_as::<_, TableRow>(&query)
            .bind(ids)
            .fetch_all(conn)
            .await
    }

    /// Move a table. Returns `false` when no row matched.
    pub async fn update_position(
        pool: &PgPool,
        id: DbId,
        x: f64,
        y: f64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE dining_tables SET position_x = $2, position_y = $3, updated_at = now() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(x)
        .bind(y)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Resize a table. Returns `false` when no row matched.
    pub async fn update_dimensions(
        pool: &PgPool,
        id: DbId,
        width: f64,
        height: f64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE dining_tables SET width = $2, height = $3, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(width)
        .bind(height)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
