//! Repository for the `business_hours` table.

use sqlx::PgPool;

use crate::models::business_hours::BusinessHours;

const COLUMNS: &str = "\
    day_of_week, is_open, total_capacity, target_occupancy, slot_minutes, \
    lunch_enabled, lunch_open, lunch_close, lunch_last_reservation, \
    dinner_open, dinner_close, dinner_last_reservation, max_capacity";

pub struct BusinessHoursRepo;

impl BusinessHoursRepo {
    pub async fn find_by_day(
        pool: &PgPool,
        day_of_week: i16,
    ) -> Result<Option<BusinessHours>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM business_hours WHERE day_of_week = $1");
        sqlx::query_as::<_, BusinessHours>(&query)
            .bind(day_of_week)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_all(pool: &PgPool) -> Result<Vec<BusinessHours>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM business_hours ORDER BY day_of_week");
        sqlx::query_as::<_, BusinessHours>(&query)
            .fetch_all(pool)
            .await
    }
}
