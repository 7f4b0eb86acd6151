//! Port contracts for shipment lifecycle management.
//!
//! Ports define infrastructure-agnostic interfaces used by shipment
//! services: one read-write persistence port and three narrow read-only
//! collaborator ports (fleet registry, deposit registry, geocoding).

pub mod deposit;
pub mod fleet;
pub mod geocoding;
pub mod repository;

pub use deposit::{Deposit, DepositError, DepositPort, DepositResult};
pub use fleet::{FleetError, FleetPort, FleetResult, Truck};
pub use geocoding::{GeoError, GeoPort, GeoResult, RouteMetrics};
pub use repository::{ShipmentRepository, ShipmentRepositoryError, ShipmentRepositoryResult};
