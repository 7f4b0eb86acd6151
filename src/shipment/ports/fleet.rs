//! Fleet registry port: read-only truck data.

use crate::shipment::domain::{CargoMetrics, TruckId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Result type for fleet registry operations.
pub type FleetResult<T> = Result<T, FleetError>;

/// Truck record exposed by the fleet registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Truck {
    /// Registration plate, the registry's natural key.
    pub id: TruckId,
    /// Maximum cargo weight in kilograms.
    pub capacity_weight_kg: f64,
    /// Maximum cargo volume in cubic metres.
    pub capacity_volume_m3: f64,
    /// Tariff charged per kilometre driven.
    pub cost_per_km: f64,
    /// Whether the carrier reports the truck as in service.
    pub available: bool,
}

impl Truck {
    /// Returns whether the truck can legally carry the given cargo.
    ///
    /// Capacity checks are inclusive: a cargo exactly at capacity fits.
    #[must_use]
    pub fn can_carry(&self, cargo: &CargoMetrics) -> bool {
        self.capacity_weight_kg >= cargo.weight_kg && self.capacity_volume_m3 >= cargo.volume_m3
    }
}

/// Read-only access to the fleet registry.
#[async_trait]
pub trait FleetPort: Send + Sync {
    /// Looks up a single truck by plate.
    ///
    /// # Errors
    ///
    /// Returns [`FleetError::TruckNotFound`] when the plate is unknown and
    /// [`FleetError::Unavailable`] when the registry cannot be reached.
    async fn get_truck(&self, id: &TruckId) -> FleetResult<Truck>;

    /// Lists every registered truck.
    ///
    /// # Errors
    ///
    /// Returns [`FleetError::Unavailable`] when the registry cannot be
    /// reached.
    async fn list_trucks(&self) -> FleetResult<Vec<Truck>>;
}

/// Errors returned by fleet registry implementations.
#[derive(Debug, Clone, Error)]
pub enum FleetError {
    /// No truck is registered under the given plate.
    #[error("truck not found: {0}")]
    TruckNotFound(TruckId),

    /// The registry could not be reached.
    #[error("fleet registry unavailable: {0}")]
    Unavailable(Arc<dyn std::error::Error + Send + Sync>),
}

impl FleetError {
    /// Wraps a transport-level failure.
    pub fn unavailable(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Unavailable(Arc::new(err))
    }
}
