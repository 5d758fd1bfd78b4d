pub mod availability;
pub mod floor;
pub mod occupancy;
pub mod reservations;
