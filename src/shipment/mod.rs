//! Shipment lifecycle management.
//!
//! A shipping request owns one or more candidate routes; a route owns an
//! ordered sequence of legs, each a single truck movement between two stops.
//! Selecting a route prunes its alternatives; starting and finishing legs
//! cascades state through the route and request machines and keeps the
//! container's derived state in sync. The module follows hexagonal
//! architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
