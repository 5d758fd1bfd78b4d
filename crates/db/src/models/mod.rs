pub mod business_hours;
pub mod reservation;
pub mod table;
