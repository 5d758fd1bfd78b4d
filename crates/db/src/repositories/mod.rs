//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that take
//! `&PgPool` (or any Postgres executor when the call must join a
//! transaction) as the first argument.

pub mod business_hours_repo;
pub mod reservation_repo;
pub mod table_repo;

pub use business_hours_repo::BusinessHoursRepo;
pub use reservation_repo::ReservationRepo;
pub use table_repo::TableRepo;
