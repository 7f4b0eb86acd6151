//! In-memory adapters for every shipment port.

mod deposit;
mod fleet;
mod geocoding;
mod repository;

pub use deposit::InMemoryDepositRegistry;
pub use fleet::InMemoryFleetRegistry;
pub use geocoding::StaticGeoService;
pub use repository::InMemoryShipmentRepository;
