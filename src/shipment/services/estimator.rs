//! Distance and cost estimation for newly created legs.

use super::pricing::PricingConfig;
use crate::shipment::domain::{CargoMetrics, LegStop};
use crate::shipment::ports::{DepositPort, FleetPort, GeoPort, Truck};
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

/// Result of estimating a single leg.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegEstimate {
    /// Estimated driving distance in kilometres.
    pub distance_km: f64,
    /// Estimated driving duration in minutes.
    pub duration_minutes: i64,
    /// Estimated transport cost.
    pub cost: f64,
}

impl LegEstimate {
    /// The zero stub recorded when geocoding is unavailable.
    ///
    /// A zero-cost leg is still creatable; the figures read as
    /// "unestimated", not as a free shipment.
    pub const UNESTIMATED: Self = Self {
        distance_km: 0.0,
        duration_minutes: 0,
        cost: 0.0,
    };
}

/// Errors produced by leg estimation.
///
/// Collaborator outages degrade to documented fallbacks and are not errors;
/// the only hard failure is a shipment no registered truck can legally
/// carry.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EstimationError {
    /// No registered truck has the capacity for the cargo.
    #[error(
        "no eligible carrier for cargo of {weight_kg} kg / {volume_m3} m3"
    )]
    NoEligibleCarrier {
        /// Cargo weight the fleet was filtered against.
        weight_kg: f64,
        /// Cargo volume the fleet was filtered against.
        volume_m3: f64,
    },
}

/// Resolves leg stops to addresses and prices the movement from
/// eligible-truck averages.
#[derive(Clone)]
pub struct CostEstimator {
    geocoding: Option<Arc<dyn GeoPort>>,
    fleet: Option<Arc<dyn FleetPort>>,
    deposits: Option<Arc<dyn DepositPort>>,
    pricing: PricingConfig,
}

impl CostEstimator {
    /// Creates an estimator with no collaborators wired; every estimate
    /// degrades to the configured fallbacks until ports are attached.
    #[must_use]
    pub const fn new(pricing: PricingConfig) -> Self {
        Self {
            geocoding: None,
            fleet: None,
            deposits: None,
            pricing,
        }
    }

    /// Attaches the geocoding collaborator.
    #[must_use]
    pub fn with_geocoding(mut self, geocoding: Arc<dyn GeoPort>) -> Self {
        self.geocoding = Some(geocoding);
        self
    }

    /// Attaches the fleet registry.
    #[must_use]
    pub fn with_fleet(mut self, fleet: Arc<dyn FleetPort>) -> Self {
        self.fleet = Some(fleet);
        self
    }

    /// Attaches the deposit registry.
    #[must_use]
    pub fn with_deposits(mut self, deposits: Arc<dyn DepositPort>) -> Self {
        self.deposits = Some(deposits);
        self
    }

    /// Resolves a stop to the address handed to the geocoder.
    ///
    /// Resolution priority: the deposit's registered address, then the
    /// stop's free-form address, then the caller-supplied fallback. A
    /// failing deposit lookup logs a warning and falls through rather than
    /// failing leg creation.
    pub async fn resolve_address(&self, stop: &LegStop, fallback: Option<&str>) -> String {
        if let Some(deposit_id) = stop.deposit_id() {
            match &self.deposits {
                Some(deposits) => match deposits.get_deposit(deposit_id).await {
                    Ok(deposit) if !deposit.address.trim().is_empty() => {
                        return deposit.address;
                    }
                    Ok(_) => {
                        warn!(%deposit_id, "deposit has no registered address, using fallback");
                    }
                    Err(err) => {
                        warn!(%deposit_id, error = %err, "deposit lookup failed, using fallback");
                    }
                },
                None => {
                    warn!(%deposit_id, "deposit registry not configured, using fallback");
                }
            }
        }
        if let Some(address) = stop.address() {
            return address.to_owned();
        }
        fallback.unwrap_or_default().to_owned()
    }

    /// Estimates distance, duration, and transport cost for a leg.
    ///
    /// Geocoding failure (or an unwired geocoder) logs a warning and yields
    /// [`LegEstimate::UNESTIMATED`] so the leg can still be created. The
    /// transport cost is `distance x mean(cost per km)` over the trucks able
    /// to carry the cargo.
    ///
    /// # Errors
    ///
    /// Returns [`EstimationError::NoEligibleCarrier`] when the fleet
    /// registry answers and no truck has capacity for the cargo; estimating
    /// a shipment no truck can legally carry is a business error, not a
    /// missing-data case.
    pub async fn estimate_leg(
        &self,
        origin: &LegStop,
        destination: &LegStop,
        cargo: CargoMetrics,
    ) -> Result<LegEstimate, EstimationError> {
        let origin_address = self.resolve_address(origin, None).await;
        let destination_address = self.resolve_address(destination, None).await;

        let Some(geocoding) = &self.geocoding else {
            warn!("geocoding not configured, recording unestimated leg");
            return Ok(LegEstimate::UNESTIMATED);
        };

        let metrics = match geocoding
            .distance(&origin_address, &destination_address)
            .await
        {
            Ok(metrics) => metrics,
            Err(err) => {
                warn!(
                    origin = %origin_address,
                    destination = %destination_address,
                    error = %err,
                    "geocoding failed, recording unestimated leg"
                );
                return Ok(LegEstimate::UNESTIMATED);
            }
        };

        let rate = self.eligible_rate(cargo).await?;
        Ok(LegEstimate {
            distance_km: metrics.distance_km,
            duration_minutes: metrics.duration_minutes,
            cost: metrics.distance_km * rate,
        })
    }

    /// Mean per-kilometre tariff over the trucks able to carry the cargo.
    async fn eligible_rate(&self, cargo: CargoMetrics) -> Result<f64, EstimationError> {
        let Some(fleet) = &self.fleet else {
            warn!("fleet registry not configured, using default tariff");
            return Ok(self.pricing.default_rate_per_km);
        };

        let trucks = match fleet.list_trucks().await {
            Ok(trucks) => trucks,
            Err(err) => {
                warn!(error = %err, "fleet listing failed, using default tariff");
                return Ok(self.pricing.default_rate_per_km);
            }
        };
        if trucks.is_empty() {
            warn!("fleet registry returned no trucks, using default tariff");
            return Ok(self.pricing.default_rate_per_km);
        }

        let eligible: Vec<&Truck> = trucks
            .iter()
            .filter(|truck| truck.available && truck.can_carry(&cargo))
            .collect();
        if eligible.is_empty() {
            return Err(EstimationError::NoEligibleCarrier {
                weight_kg: cargo.weight_kg,
                volume_m3: cargo.volume_m3,
            });
        }

        let total: f64 = eligible.iter().map(|truck| truck.cost_per_km).sum();
        Ok(total / eligible.len() as f64)
    }
}
