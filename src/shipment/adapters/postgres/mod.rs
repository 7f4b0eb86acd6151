//! `PostgreSQL` adapters for shipment lifecycle persistence.

mod models;
mod repository;
mod schema;

pub use repository::{PostgresShipmentRepository, ShipmentPgPool};
