//! Domain logic for table capacity, availability and floor layout.
//!
//! Everything here is free of database and HTTP concerns. Operations that
//! need persisted state take a [`store::ReservationStore`] explicitly so the
//! same code runs against Postgres in production and an in-memory store in
//! tests.

pub mod availability;
pub mod booking;
pub mod capacity;
pub mod error;
pub mod floor;
pub mod occupancy;
pub mod reservation;
pub mod store;
pub mod table;
pub mod types;
