//! Leg aggregate: one truck movement between two stops.

use super::{DepositId, LegId, LegOrder, RouteId, ShipmentDomainError, TruckId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Leg lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegState {
    /// Created with distance/cost estimates, awaiting a truck.
    Estimated,
    /// A truck has been admitted and bound to the leg.
    Assigned,
    /// The truck is underway.
    Started,
    /// The movement is complete and actuals are recorded.
    Finished,
}

impl LegState {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Estimated => "estimated",
            Self::Assigned => "assigned",
            Self::Started => "started",
            Self::Finished => "finished",
        }
    }

    /// Returns whether `self -> target` is a legal transition.
    ///
    /// The only legal sequence is estimated, assigned, started, finished,
    /// one step at a time.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Estimated, Self::Assigned)
                | (Self::Assigned, Self::Started)
                | (Self::Started, Self::Finished)
        )
    }

    /// Returns a description of the legal successor, for diagnostics.
    #[must_use]
    pub const fn allowed_successor(self) -> &'static str {
        match self {
            Self::Estimated => "assigned",
            Self::Assigned => "started",
            Self::Started => "finished",
            Self::Finished => "none (terminal state)",
        }
    }

    /// Returns whether the state is terminal.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Finished)
    }

    /// Returns whether a leg in this state holds its truck exclusively.
    #[must_use]
    pub const fn holds_truck(self) -> bool {
        matches!(self, Self::Assigned | Self::Started)
    }
}

impl TryFrom<&str> for LegState {
    type Error = super::ParseLegStateError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            // "pending" is the pre-estimation shape of historical records;
            // it admits the same single successor as "estimated".
            "estimated" | "pending" => Ok(Self::Estimated),
            "assigned" => Ok(Self::Assigned),
            "started" => Ok(Self::Started),
            "finished" => Ok(Self::Finished),
            _ => Err(super::ParseLegStateError(value.to_owned())),
        }
    }
}

impl fmt::Display for LegState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which end of a leg a stop describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopKind {
    /// The departure end.
    Origin,
    /// The arrival end.
    Destination,
}

impl fmt::Display for StopKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Origin => f.write_str("origin"),
            Self::Destination => f.write_str("destination"),
        }
    }
}

/// One end of a leg: either a registered deposit or a free-form address,
/// never both and never neither.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LegStop {
    /// A deposit registered with the deposit registry.
    Deposit {
        /// Registry identifier of the deposit.
        deposit_id: DepositId,
    },
    /// A free-form street address.
    Address {
        /// The address text, as supplied by the caller.
        address: String,
    },
}

impl LegStop {
    /// Builds a stop from the two mutually exclusive caller-supplied forms.
    ///
    /// # Errors
    ///
    /// Returns [`ShipmentDomainError::MissingStop`] when both forms are
    /// absent (a blank address counts as absent) and
    /// [`ShipmentDomainError::AmbiguousStop`] when both are present.
    pub fn from_forms(
        kind: StopKind,
        deposit_id: Option<DepositId>,
        address: Option<String>,
    ) -> Result<Self, ShipmentDomainError> {
        let trimmed_address = address.filter(|value| !value.trim().is_empty());
        match (deposit_id, trimmed_address) {
            (Some(_), Some(_)) => Err(ShipmentDomainError::AmbiguousStop(kind)),
            (None, None) => Err(ShipmentDomainError::MissingStop(kind)),
            (Some(deposit_id), None) => Ok(Self::Deposit { deposit_id }),
            (None, Some(address)) => Ok(Self::Address { address }),
        }
    }

    /// Returns the deposit reference when the stop is a deposit.
    #[must_use]
    pub const fn deposit_id(&self) -> Option<DepositId> {
        match self {
            Self::Deposit { deposit_id } => Some(*deposit_id),
            Self::Address { .. } => None,
        }
    }

    /// Returns the free-form address when the stop is one.
    #[must_use]
    pub fn address(&self) -> Option<&str> {
        match self {
            Self::Deposit { .. } => None,
            Self::Address { address } => Some(address),
        }
    }
}

/// Leg aggregate root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leg {
    id: LegId,
    route_id: RouteId,
    order: LegOrder,
    origin: LegStop,
    destination: LegStop,
    truck: Option<TruckId>,
    state: LegState,
    planned_start: Option<DateTime<Utc>>,
    planned_end: Option<DateTime<Utc>>,
    estimated_distance_km: f64,
    estimated_cost: f64,
    actual_start: Option<DateTime<Utc>>,
    actual_end: Option<DateTime<Utc>>,
    odometer_start: Option<f64>,
    odometer_end: Option<f64>,
    actual_distance_km: Option<f64>,
    actual_cost: Option<f64>,
    actual_hours: Option<f64>,
    dwell_hours: Option<f64>,
    dwell_cost: Option<f64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted leg.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedLegData {
    /// Persisted leg identifier.
    pub id: LegId,
    /// Persisted owning route.
    pub route_id: RouteId,
    /// Persisted position within the route.
    pub order: LegOrder,
    /// Persisted departure stop.
    pub origin: LegStop,
    /// Persisted arrival stop.
    pub destination: LegStop,
    /// Persisted truck binding, if any.
    pub truck: Option<TruckId>,
    /// Persisted lifecycle state.
    pub state: LegState,
    /// Persisted planned departure time.
    pub planned_start: Option<DateTime<Utc>>,
    /// Persisted planned arrival time.
    pub planned_end: Option<DateTime<Utc>>,
    /// Persisted estimated distance.
    pub estimated_distance_km: f64,
    /// Persisted estimated transport cost.
    pub estimated_cost: f64,
    /// Persisted real departure time.
    pub actual_start: Option<DateTime<Utc>>,
    /// Persisted real arrival time.
    pub actual_end: Option<DateTime<Utc>>,
    /// Persisted odometer reading at departure.
    pub odometer_start: Option<f64>,
    /// Persisted odometer reading at arrival.
    pub odometer_end: Option<f64>,
    /// Persisted real distance.
    pub actual_distance_km: Option<f64>,
    /// Persisted real transport cost.
    pub actual_cost: Option<f64>,
    /// Persisted real driving time in hours.
    pub actual_hours: Option<f64>,
    /// Persisted dwell time before this leg began.
    pub dwell_hours: Option<f64>,
    /// Persisted dwell cost before this leg began.
    pub dwell_cost: Option<f64>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest lifecycle timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Leg {
    /// Creates a new estimated leg within a route.
    #[must_use]
    pub fn new(
        route_id: RouteId,
        order: LegOrder,
        origin: LegStop,
        destination: LegStop,
        clock: &impl Clock,
    ) -> Self {
        let timestamp = clock.utc();
        Self {
            id: LegId::new(),
            route_id,
            order,
            origin,
            destination,
            truck: None,
            state: LegState::Estimated,
            planned_start: None,
            planned_end: None,
            estimated_distance_km: 0.0,
            estimated_cost: 0.0,
            actual_start: None,
            actual_end: None,
            odometer_start: None,
            odometer_end: None,
            actual_distance_km: None,
            actual_cost: None,
            actual_hours: None,
            dwell_hours: None,
            dwell_cost: None,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Sets the planned departure/arrival window.
    #[must_use]
    pub const fn with_planned_window(
        mut self,
        planned_start: DateTime<Utc>,
        planned_end: DateTime<Utc>,
    ) -> Self {
        self.planned_start = Some(planned_start);
        self.planned_end = Some(planned_end);
        self
    }

    /// Sets the estimated distance and transport cost.
    #[must_use]
    pub const fn with_estimate(mut self, distance_km: f64, cost: f64) -> Self {
        self.estimated_distance_km = distance_km;
        self.estimated_cost = cost;
        self
    }

    /// Reconstructs a leg from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedLegData) -> Self {
        Self {
            id: data.id,
            route_id: data.route_id,
            order: data.order,
            origin: data.origin,
            destination: data.destination,
            truck: data.truck,
            state: data.state,
            planned_start: data.planned_start,
            planned_end: data.planned_end,
            estimated_distance_km: data.estimated_distance_km,
            estimated_cost: data.estimated_cost,
            actual_start: data.actual_start,
            actual_end: data.actual_end,
            odometer_start: data.odometer_start,
            odometer_end: data.odometer_end,
            actual_distance_km: data.actual_distance_km,
            actual_cost: data.actual_cost,
            actual_hours: data.actual_hours,
            dwell_hours: data.dwell_hours,
            dwell_cost: data.dwell_cost,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the leg identifier.
    #[must_use]
    pub const fn id(&self) -> LegId {
        self.id
    }

    /// Returns the owning route.
    #[must_use]
    pub const fn route_id(&self) -> RouteId {
        self.route_id
    }

    /// Returns the leg's position within its route.
    #[must_use]
    pub const fn order(&self) -> LegOrder {
        self.order
    }

    /// Returns the departure stop.
    #[must_use]
    pub const fn origin(&self) -> &LegStop {
        &self.origin
    }

    /// Returns the arrival stop.
    #[must_use]
    pub const fn destination(&self) -> &LegStop {
        &self.destination
    }

    /// Returns the bound truck, if any.
    #[must_use]
    pub const fn truck(&self) -> Option<&TruckId> {
        self.truck.as_ref()
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub const fn state(&self) -> LegState {
        self.state
    }

    /// Returns the planned departure time.
    #[must_use]
    pub const fn planned_start(&self) -> Option<DateTime<Utc>> {
        self.planned_start
    }

    /// Returns the planned arrival time.
    #[must_use]
    pub const fn planned_end(&self) -> Option<DateTime<Utc>> {
        self.planned_end
    }

    /// Returns the estimated distance in kilometres.
    #[must_use]
    pub const fn estimated_distance_km(&self) -> f64 {
        self.estimated_distance_km
    }

    /// Returns the estimated transport cost.
    #[must_use]
    pub const fn estimated_cost(&self) -> f64 {
        self.estimated_cost
    }

    /// Returns the real departure time.
    #[must_use]
    pub const fn actual_start(&self) -> Option<DateTime<Utc>> {
        self.actual_start
    }

    /// Returns the real arrival time.
    #[must_use]
    pub const fn actual_end(&self) -> Option<DateTime<Utc>> {
        self.actual_end
    }

    /// Returns the odometer reading recorded at departure.
    #[must_use]
    pub const fn odometer_start(&self) -> Option<f64> {
        self.odometer_start
    }

    /// Returns the odometer reading recorded at arrival.
    #[must_use]
    pub const fn odometer_end(&self) -> Option<f64> {
        self.odometer_end
    }

    /// Returns the real distance in kilometres.
    #[must_use]
    pub const fn actual_distance_km(&self) -> Option<f64> {
        self.actual_distance_km
    }

    /// Returns the real transport cost.
    #[must_use]
    pub const fn actual_cost(&self) -> Option<f64> {
        self.actual_cost
    }

    /// Returns the real driving time in hours.
    #[must_use]
    pub const fn actual_hours(&self) -> Option<f64> {
        self.actual_hours
    }

    /// Returns the dwell time waited before this leg began.
    #[must_use]
    pub const fn dwell_hours(&self) -> Option<f64> {
        self.dwell_hours
    }

    /// Returns the dwell cost accrued before this leg began.
    #[must_use]
    pub const fn dwell_cost(&self) -> Option<f64> {
        self.dwell_cost
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

    /// Returns the planned window length in hours, when both ends are set.
    #[must_use]
    pub fn planned_hours(&self) -> Option<f64> {
        match (self.planned_start, self.planned_end) {
            (Some(start), Some(end)) => Some(hours_between(start, end)),
            _ => None,
        }
    }

    /// Returns the odometer delta when both readings are present and the
    /// difference is non-negative.
    #[must_use]
    pub fn odometer_delta(&self) -> Option<f64> {
        match (self.odometer_start, self.odometer_end) {
            (Some(start), Some(end)) if end >= start => Some(end - start),
            _ => None,
        }
    }

    /// Binds a truck and moves the leg to [`LegState::Assigned`].
    ///
    /// # Errors
    ///
    /// Returns [`ShipmentDomainError::InvalidLegTransition`] unless the leg
    /// is currently [`LegState::Estimated`].
    pub fn assign_truck(
        &mut self,
        truck: TruckId,
        clock: &impl Clock,
    ) -> Result<(), ShipmentDomainError> {
        self.check_transition(LegState::Assigned)?;
        self.truck = Some(truck);
        self.state = LegState::Assigned;
        self.touch(clock);
        Ok(())
    }

    /// Marks the leg underway, stamping the real departure time.
    ///
    /// # Errors
    ///
    /// Returns [`ShipmentDomainError::InvalidLegTransition`] unless the leg
    /// is currently [`LegState::Assigned`].
    pub fn start(
        &mut self,
        odometer_start: Option<f64>,
        clock: &impl Clock,
    ) -> Result<(), ShipmentDomainError> {
        self.check_transition(LegState::Started)?;
        self.state = LegState::Started;
        self.actual_start = Some(clock.utc());
        if odometer_start.is_some() {
            self.odometer_start = odometer_start;
        }
        self.touch(clock);
        Ok(())
    }

    /// Records the dwell accrued at a deposit before this leg began.
    pub fn record_dwell(&mut self, hours: f64, cost: f64, clock: &impl Clock) {
        self.dwell_hours = Some(hours);
        self.dwell_cost = Some(cost);
        self.touch(clock);
    }

    /// Marks the leg finished, stamping the real arrival time and deriving
    /// the real driving hours.
    ///
    /// # Errors
    ///
    /// Returns [`ShipmentDomainError::InvalidLegTransition`] unless the leg
    /// is currently [`LegState::Started`].
    pub fn finish(
        &mut self,
        finished_at: Option<DateTime<Utc>>,
        odometer_end: Option<f64>,
        clock: &impl Clock,
    ) -> Result<(), ShipmentDomainError> {
        self.check_transition(LegState::Finished)?;
        self.state = LegState::Finished;
        let end = finished_at.unwrap_or_else(|| clock.utc());
        self.actual_end = Some(end);
        if odometer_end.is_some() {
            self.odometer_end = odometer_end;
        }
        if let Some(start) = self.actual_start {
            self.actual_hours = Some(hours_between(start, end));
        }
        self.touch(clock);
        Ok(())
    }

    /// Records the computed real distance and cost.
    pub fn record_actuals(&mut self, distance_km: f64, cost: f64, clock: &impl Clock) {
        self.actual_distance_km = Some(distance_km);
        self.actual_cost = Some(cost);
        self.touch(clock);
    }

    fn check_transition(&self, target: LegState) -> Result<(), ShipmentDomainError> {
        if self.state.can_transition_to(target) {
            Ok(())
        } else {
            Err(ShipmentDomainError::InvalidLegTransition {
                leg_id: self.id,
                from: self.state,
                to: target,
                allowed: self.state.allowed_successor(),
            })
        }
    }

    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}

/// Fractional hours between two instants, negative when `end` precedes
/// `start`.
pub(crate) fn hours_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    let minutes = (end - start).num_minutes();
    minutes as f64 / 60.0
}
