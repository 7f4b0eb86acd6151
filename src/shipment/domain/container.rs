//! Container aggregate and its derived lifecycle state.

use super::{ContainerId, CustomerId, DepositId, ShipmentDomainError};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Container lifecycle state.
///
/// Once a shipment is active this state is a derived side effect of leg
/// transitions, updated exclusively through [`Container::apply`]; clients
/// never set it directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerState {
    /// Sitting at the customer's origin address.
    Origin,
    /// Free to be attached to a new shipping request.
    Available,
    /// On a truck, moving along a started leg.
    InTransit,
    /// Waiting at a deposit between two legs.
    InDeposit,
    /// Delivered at the final destination.
    Delivered,
}

impl ContainerState {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Origin => "origin",
            Self::Available => "available",
            Self::InTransit => "in_transit",
            Self::InDeposit => "in_deposit",
            Self::Delivered => "delivered",
        }
    }

    /// Returns whether a container in this state may be attached to a new
    /// shipping request.
    ///
    /// A container that is mid-shipment (in transit or parked at a deposit)
    /// belongs to its active request; delivered containers are reusable.
    #[must_use]
    pub const fn admits_new_request(self) -> bool {
        match self {
            Self::Origin | Self::Available | Self::Delivered => true,
            Self::InTransit | Self::InDeposit => false,
        }
    }
}

impl TryFrom<&str> for ContainerState {
    type Error = super::ParseContainerStateError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "origin" => Ok(Self::Origin),
            "available" => Ok(Self::Available),
            "in_transit" => Ok(Self::InTransit),
            "in_deposit" => Ok(Self::InDeposit),
            "delivered" => Ok(Self::Delivered),
            _ => Err(super::ParseContainerStateError(value.to_owned())),
        }
    }
}

impl fmt::Display for ContainerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Measured cargo figures, authoritative for capacity checks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CargoMetrics {
    /// Real weight in kilograms.
    pub weight_kg: f64,
    /// Real volume in cubic metres.
    pub volume_m3: f64,
}

/// Lifecycle event applied to a container by the leg state machine.
///
/// This is the single choke point through which leg transitions mutate
/// container state; nothing else in the crate touches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerEvent {
    /// A leg carrying the container has started.
    LegStarted,
    /// An intermediate leg finished at the given deposit.
    ArrivedAtDeposit(DepositId),
    /// The final leg of the selected route finished.
    DeliveryCompleted,
}

/// Container aggregate root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Container {
    id: ContainerId,
    customer_id: CustomerId,
    description: String,
    kind: Option<String>,
    declared_capacity_kg: Option<f64>,
    weight_kg: Option<f64>,
    volume_m3: Option<f64>,
    state: ContainerState,
    current_deposit: Option<DepositId>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted container.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedContainerData {
    /// Persisted container identifier.
    pub id: ContainerId,
    /// Persisted owning customer.
    pub customer_id: CustomerId,
    /// Persisted descriptive text.
    pub description: String,
    /// Persisted container kind, if any.
    pub kind: Option<String>,
    /// Persisted declared weight capacity.
    pub declared_capacity_kg: Option<f64>,
    /// Persisted real weight.
    pub weight_kg: Option<f64>,
    /// Persisted real volume.
    pub volume_m3: Option<f64>,
    /// Persisted lifecycle state.
    pub state: ContainerState,
    /// Persisted deposit reference, if any.
    pub current_deposit: Option<DepositId>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest lifecycle timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Container {
    /// Creates a new available container for a customer.
    #[must_use]
    pub fn new(customer_id: CustomerId, description: impl Into<String>, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            id: ContainerId::new(),
            customer_id,
            description: description.into(),
            kind: None,
            declared_capacity_kg: None,
            weight_kg: None,
            volume_m3: None,
            state: ContainerState::Available,
            current_deposit: None,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Sets the container kind.
    #[must_use]
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Sets the declared weight capacity.
    #[must_use]
    pub const fn with_declared_capacity(mut self, capacity_kg: f64) -> Self {
        self.declared_capacity_kg = Some(capacity_kg);
        self
    }

    /// Sets the measured weight and volume.
    #[must_use]
    pub const fn with_real_metrics(mut self, weight_kg: f64, volume_m3: f64) -> Self {
        self.weight_kg = Some(weight_kg);
        self.volume_m3 = Some(volume_m3);
        self
    }

    /// Reconstructs a container from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns [`ShipmentDomainError::DepositRefRequired`] when the state is
    /// [`ContainerState::InDeposit`] without a deposit reference, or
    /// [`ShipmentDomainError::UnexpectedDepositRef`] when any other state
    /// carries one.
    pub fn from_persisted(data: PersistedContainerData) -> Result<Self, ShipmentDomainError> {
        match (data.state, data.current_deposit) {
            (ContainerState::InDeposit, None) => {
                return Err(ShipmentDomainError::DepositRefRequired(data.id));
            }
            (state, Some(_)) if state != ContainerState::InDeposit => {
                return Err(ShipmentDomainError::UnexpectedDepositRef {
                    container_id: data.id,
                    state,
                });
            }
            _ => {}
        }

        Ok(Self {
            id: data.id,
            customer_id: data.customer_id,
            description: data.description,
            kind: data.kind,
            declared_capacity_kg: data.declared_capacity_kg,
            weight_kg: data.weight_kg,
            volume_m3: data.volume_m3,
            state: data.state,
            current_deposit: data.current_deposit,
            created_at: data.created_at,
            updated_at: data.updated_at,
        })
    }

    /// Returns the container identifier.
    #[must_use]
    pub const fn id(&self) -> ContainerId {
        self.id
    }

    /// Returns the owning customer.
    #[must_use]
    pub const fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    /// Returns the descriptive text.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the container kind, if recorded.
    #[must_use]
    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    /// Returns the declared weight capacity.
    #[must_use]
    pub const fn declared_capacity_kg(&self) -> Option<f64> {
        self.declared_capacity_kg
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub const fn state(&self) -> ContainerState {
        self.state
    }

    /// Returns the deposit the container is currently parked at, if any.
    #[must_use]
    pub const fn current_deposit(&self) -> Option<DepositId> {
        self.current_deposit
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest lifecycle timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns the measured weight as recorded, without validation.
    #[must_use]
    pub const fn weight_kg(&self) -> Option<f64> {
        self.weight_kg
    }

    /// Returns the measured volume as recorded, without validation.
    #[must_use]
    pub const fn volume_m3(&self) -> Option<f64> {
        self.volume_m3
    }

    /// Returns the measured cargo figures when both are present and
    /// positive.
    ///
    /// Admission control treats anything less as missing client data, never
    /// as zero cargo.
    #[must_use]
    pub fn real_metrics(&self) -> Option<CargoMetrics> {
        match (self.weight_kg, self.volume_m3) {
            (Some(weight_kg), Some(volume_m3)) if weight_kg > 0.0 && volume_m3 > 0.0 => {
                Some(CargoMetrics {
                    weight_kg,
                    volume_m3,
                })
            }
            _ => None,
        }
    }

    /// Returns the best-effort cargo figures for pre-assignment estimation.
    ///
    /// Prefers the measured weight, falling back to the declared capacity;
    /// an unknown figure counts as zero so every truck stays eligible until
    /// real metrics arrive. Admission control uses the stricter
    /// [`Container::real_metrics`] instead.
    #[must_use]
    pub fn estimation_metrics(&self) -> CargoMetrics {
        let weight_kg = self
            .weight_kg
            .filter(|weight| *weight > 0.0)
            .or(self.declared_capacity_kg)
            .unwrap_or(0.0);
        let volume_m3 = self.volume_m3.filter(|volume| *volume > 0.0).unwrap_or(0.0);
        CargoMetrics {
            weight_kg,
            volume_m3,
        }
    }

    /// Applies a leg-driven lifecycle event.
    ///
    /// The event vocabulary only produces valid state/deposit combinations,
    /// so the `InDeposit` invariant holds by construction.
    pub fn apply(&mut self, event: ContainerEvent, clock: &impl Clock) {
        match event {
            ContainerEvent::LegStarted => {
                self.state = ContainerState::InTransit;
                self.current_deposit = None;
            }
            ContainerEvent::ArrivedAtDeposit(deposit_id) => {
                self.state = ContainerState::InDeposit;
                self.current_deposit = Some(deposit_id);
            }
            ContainerEvent::DeliveryCompleted => {
                self.state = ContainerState::Delivered;
                self.current_deposit = None;
            }
        }
        self.updated_at = clock.utc();
    }
}
