//! Admission control: may this truck be bound to this leg?

use crate::shipment::domain::{Container, ContainerId, Leg, LegId, TruckId};
use crate::shipment::ports::{
    FleetError, FleetPort, ShipmentRepository, ShipmentRepositoryError,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

/// Errors raised while admitting a truck to a leg.
///
/// The variants are deliberately distinct from plain state errors so a
/// caller can tell "re-plan the shipment" (`InsufficientCapacity`) apart
/// from "retry with another truck" (`TruckInUse`) and "fix the container
/// record" (`MissingContainerMetrics`).
#[derive(Debug, Error)]
pub enum AdmissionError {
    /// Another assigned or started leg already holds the truck.
    #[error("truck {truck} is already bound to active leg {holder}")]
    TruckInUse {
        /// The contested truck.
        truck: TruckId,
        /// The leg currently holding it.
        holder: LegId,
    },

    /// The container lacks the measured weight or volume needed for the
    /// capacity check.
    #[error(
        "container {0} has no usable real weight/volume; record real metrics before assigning a truck"
    )]
    MissingContainerMetrics(ContainerId),

    /// The truck's registered capacity is below the cargo.
    #[error(
        "truck {truck} cannot carry {required_weight_kg} kg / {required_volume_m3} m3 \
         (capacity {capacity_weight_kg} kg / {capacity_volume_m3} m3)"
    )]
    InsufficientCapacity {
        /// The rejected truck.
        truck: TruckId,
        /// Cargo weight required.
        required_weight_kg: f64,
        /// Cargo volume required.
        required_volume_m3: f64,
        /// Registered weight capacity.
        capacity_weight_kg: f64,
        /// Registered volume capacity.
        capacity_volume_m3: f64,
    },

    /// The fleet registry failed while resolving the truck.
    #[error(transparent)]
    Fleet(#[from] FleetError),

    /// The exclusivity query failed.
    #[error(transparent)]
    Repository(#[from] ShipmentRepositoryError),
}

/// Admission checks performed before binding a truck to a leg.
///
/// All three checks consult external state synchronously; no reservation
/// table is held here. Exclusivity is recomputed from current leg states on
/// every call, and the repository's uniqueness guarantee on active
/// truck bindings closes the remaining check-then-act window.
pub struct AdmissionPolicy<R> {
    repository: Arc<R>,
    fleet: Option<Arc<dyn FleetPort>>,
}

impl<R> AdmissionPolicy<R>
where
    R: ShipmentRepository,
{
    /// Creates a policy without a fleet registry; capacity checks degrade
    /// to admission with a warning until one is attached.
    #[must_use]
    pub const fn new(repository: Arc<R>) -> Self {
        Self {
            repository,
            fleet: None,
        }
    }

    /// Attaches the fleet registry used for capacity checks.
    #[must_use]
    pub fn with_fleet(mut self, fleet: Arc<dyn FleetPort>) -> Self {
        self.fleet = Some(fleet);
        self
    }

    /// Runs the admission checks, in order: exclusivity, container data
    /// completeness, capacity.
    ///
    /// # Errors
    ///
    /// Returns [`AdmissionError::TruckInUse`],
    /// [`AdmissionError::MissingContainerMetrics`], or
    /// [`AdmissionError::InsufficientCapacity`] for the respective check, and
    /// propagates port failures.
    pub async fn authorize(
        &self,
        leg: &Leg,
        truck: &TruckId,
        container: &Container,
    ) -> Result<(), AdmissionError> {
        if let Some(holder) = self
            .repository
            .active_leg_for_truck(truck, Some(leg.id()))
            .await?
        {
            return Err(AdmissionError::TruckInUse {
                truck: truck.clone(),
                holder: holder.id(),
            });
        }

        let cargo = container
            .real_metrics()
            .ok_or_else(|| AdmissionError::MissingContainerMetrics(container.id()))?;

        let Some(fleet) = &self.fleet else {
            warn!(%truck, "fleet registry not configured, admitting truck without capacity check");
            return Ok(());
        };
        let record = fleet.get_truck(truck).await?;
        if !record.can_carry(&cargo) {
            return Err(AdmissionError::InsufficientCapacity {
                truck: truck.clone(),
                required_weight_kg: cargo.weight_kg,
                required_volume_m3: cargo.volume_m3,
                capacity_weight_kg: record.capacity_weight_kg,
                capacity_volume_m3: record.capacity_volume_m3,
            });
        }
        Ok(())
    }
}
