//! Shipping request aggregate: the customer-facing unit of work.

use super::{ContainerId, CustomerId, RequestId, ShipmentDomainError};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Shipping request lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestState {
    /// Created; candidate routes may still be drafted and compared.
    Draft,
    /// A route has been selected and the shipment is planned.
    Scheduled,
    /// The first leg of the selected route has started.
    InTransit,
    /// The last leg has finished and totals are consolidated.
    Delivered,
    /// Abandoned before execution began.
    Cancelled,
}

impl RequestState {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Scheduled => "scheduled",
            Self::InTransit => "in_transit",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns whether `self -> target` is a legal transition.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Draft, Self::Scheduled | Self::Cancelled)
                | (Self::Scheduled, Self::InTransit | Self::Cancelled)
                | (Self::InTransit, Self::Delivered)
        )
    }

    /// Returns whether the state is terminal.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Returns whether the shipment is locked against re-planning.
    ///
    /// Once in transit or delivered, routes may no longer be selected,
    /// swapped, or deleted.
    #[must_use]
    pub const fn is_locked(self) -> bool {
        matches!(self, Self::InTransit | Self::Delivered)
    }
}

impl TryFrom<&str> for RequestState {
    type Error = super::ParseRequestStateError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "draft" => Ok(Self::Draft),
            "scheduled" => Ok(Self::Scheduled),
            "in_transit" => Ok(Self::InTransit),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(super::ParseRequestStateError(value.to_owned())),
        }
    }
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Consolidated cost/time totals over the legs of the selected route.
///
/// Variance figures are derived at read time and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShipmentTotals {
    /// Sum of per-leg estimated transport costs.
    pub estimated_cost: f64,
    /// Sum of per-leg real transport costs plus dwell costs.
    pub real_cost: f64,
    /// Sum of per-leg planned window durations, in hours.
    pub estimated_hours: f64,
    /// Sum of per-leg real driving hours plus dwell hours.
    pub real_hours: f64,
}

impl ShipmentTotals {
    /// Real minus estimated cost.
    #[must_use]
    pub const fn cost_variance(&self) -> f64 {
        self.real_cost - self.estimated_cost
    }

    /// Cost variance as a percentage of the estimate, when an estimate
    /// exists.
    #[must_use]
    pub fn cost_variance_pct(&self) -> Option<f64> {
        if self.estimated_cost == 0.0 {
            None
        } else {
            Some(self.cost_variance() / self.estimated_cost * 100.0)
        }
    }

    /// Real minus estimated hours.
    #[must_use]
    pub const fn time_variance_hours(&self) -> f64 {
        self.real_hours - self.estimated_hours
    }
}

/// Shipping request aggregate root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingRequest {
    id: RequestId,
    container_id: ContainerId,
    customer_id: CustomerId,
    state: RequestState,
    totals: Option<ShipmentTotals>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted shipping request.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedRequestData {
    /// Persisted request identifier.
    pub id: RequestId,
    /// Persisted container reference.
    pub container_id: ContainerId,
    /// Persisted customer reference.
    pub customer_id: CustomerId,
    /// Persisted lifecycle state.
    pub state: RequestState,
    /// Persisted consolidated totals, once delivered.
    pub totals: Option<ShipmentTotals>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest lifecycle timestamp.
    pub updated_at: DateTime<Utc>,
}

impl ShippingRequest {
    /// Creates a new draft request moving `container_id` for `customer_id`.
    #[must_use]
    pub fn new(container_id: ContainerId, customer_id: CustomerId, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            id: RequestId::new(),
            container_id,
            customer_id,
            state: RequestState::Draft,
            totals: None,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a request from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedRequestData) -> Self {
        Self {
            id: data.id,
            container_id: data.container_id,
            customer_id: data.customer_id,
            state: data.state,
            totals: data.totals,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the request identifier.
    #[must_use]
    pub const fn id(&self) -> RequestId {
        self.id
    }

    /// Returns the referenced container.
    #[must_use]
    pub const fn container_id(&self) -> ContainerId {
        self.container_id
    }

    /// Returns the owning customer.
    #[must_use]
    pub const fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub const fn state(&self) -> RequestState {
        self.state
    }

    /// Returns the consolidated totals, once delivered.
    #[must_use]
    pub const fn totals(&self) -> Option<&ShipmentTotals> {
        self.totals.as_ref()
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

    /// Transitions the request to `target`.
    ///
    /// # Errors
    ///
    /// Returns [`ShipmentDomainError::InvalidRequestTransition`] when the
    /// transition is not legal from the current state.
    pub fn transition_to(
        &mut self,
        target: RequestState,
        clock: &impl Clock,
    ) -> Result<(), ShipmentDomainError> {
        if !self.state.can_transition_to(target) {
            return Err(ShipmentDomainError::InvalidRequestTransition {
                request_id: self.id,
                from: self.state,
                to: target,
            });
        }
        self.state = target;
        self.touch(clock);
        Ok(())
    }

    /// Writes the consolidated totals and moves the request to
    /// [`RequestState::Delivered`].
    ///
    /// Consolidation recomputes from the source legs, so re-invoking on an
    /// already delivered request refreshes the totals instead of failing.
    ///
    /// # Errors
    ///
    /// Returns [`ShipmentDomainError::InvalidRequestTransition`] unless the
    /// request is in transit or already delivered.
    pub fn record_totals(
        &mut self,
        totals: ShipmentTotals,
        clock: &impl Clock,
    ) -> Result<(), ShipmentDomainError> {
        if self.state != RequestState::Delivered {
            self.transition_to(RequestState::Delivered, clock)?;
        }
        self.totals = Some(totals);
        self.touch(clock);
        Ok(())
    }

    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}
