//! Route aggregate: an ordered sequence of legs proposed for a request.

use super::{RequestId, RouteId, ShipmentDomainError};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Route lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteState {
    /// Proposed; no leg has started yet.
    Pending,
    /// At least one leg has started.
    Running,
    /// Every leg has finished.
    Completed,
    /// Abandoned before execution.
    Cancelled,
    /// Pruned when a sibling route was selected.
    Discarded,
}

impl RouteState {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Discarded => "discarded",
        }
    }

    /// Returns whether `self -> target` is a legal transition.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Pending, Self::Running | Self::Cancelled | Self::Discarded)
                | (Self::Running, Self::Completed)
        )
    }

    /// Returns whether the state is terminal.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Discarded)
    }
}

impl TryFrom<&str> for RouteState {
    type Error = super::ParseRouteStateError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "pending" => Ok(Self::Pending),
            "running" => Ok(Self::Running),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            "discarded" => Ok(Self::Discarded),
            _ => Err(super::ParseRouteStateError(value.to_owned())),
        }
    }
}

impl fmt::Display for RouteState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Route aggregate root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    id: RouteId,
    request_id: RequestId,
    name: String,
    description: Option<String>,
    state: RouteState,
    selected: bool,
    total_distance_km: f64,
    estimated_hours: f64,
    estimated_cost: f64,
    real_cost: Option<f64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted route.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedRouteData {
    /// Persisted route identifier.
    pub id: RouteId,
    /// Persisted owning request.
    pub request_id: RequestId,
    /// Persisted display name.
    pub name: String,
    /// Persisted description, if any.
    pub description: Option<String>,
    /// Persisted lifecycle state.
    pub state: RouteState,
    /// Persisted selection flag.
    pub selected: bool,
    /// Persisted aggregate estimated distance.
    pub total_distance_km: f64,
    /// Persisted aggregate estimated duration.
    pub estimated_hours: f64,
    /// Persisted aggregate estimated cost.
    pub estimated_cost: f64,
    /// Persisted aggregate real cost, once completed.
    pub real_cost: Option<f64>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest lifecycle timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Route {
    /// Creates a new pending, unselected route for a request.
    #[must_use]
    pub fn new(request_id: RequestId, name: impl Into<String>, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            id: RouteId::new(),
            request_id,
            name: name.into(),
            description: None,
            state: RouteState::Pending,
            selected: false,
            total_distance_km: 0.0,
            estimated_hours: 0.0,
            estimated_cost: 0.0,
            real_cost: None,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Sets the route description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Reconstructs a route from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedRouteData) -> Self {
        Self {
            id: data.id,
            request_id: data.request_id,
            name: data.name,
            description: data.description,
            state: data.state,
            selected: data.selected,
            total_distance_km: data.total_distance_km,
            estimated_hours: data.estimated_hours,
            estimated_cost: data.estimated_cost,
            real_cost: data.real_cost,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the route identifier.
    #[must_use]
    pub const fn id(&self) -> RouteId {
        self.id
    }

    /// Returns the owning request.
    #[must_use]
    pub const fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub const fn state(&self) -> RouteState {
        self.state
    }

    /// Returns whether this is the request's selected route.
    #[must_use]
    pub const fn is_selected(&self) -> bool {
        self.selected
    }

    /// Returns the aggregate estimated distance.
    #[must_use]
    pub const fn total_distance_km(&self) -> f64 {
        self.total_distance_km
    }

    /// Returns the aggregate estimated duration in hours.
    #[must_use]
    pub const fn estimated_hours(&self) -> f64 {
        self.estimated_hours
    }

    /// Returns the aggregate estimated cost.
    #[must_use]
    pub const fn estimated_cost(&self) -> f64 {
        self.estimated_cost
    }

    /// Returns the aggregate real cost, once recorded.
    #[must_use]
    pub const fn real_cost(&self) -> Option<f64> {
        self.real_cost
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

    /// Marks this route as the request's selected route.
    ///
    /// Selection resets the state to [`RouteState::Pending`]; pruning of the
    /// sibling alternatives is the planning service's responsibility.
    pub fn mark_selected(&mut self, clock: &impl Clock) {
        self.selected = true;
        self.state = RouteState::Pending;
        self.touch(clock);
    }

    /// Folds a newly estimated leg into the route aggregates.
    pub fn add_estimated_leg(
        &mut self,
        distance_km: f64,
        hours: f64,
        cost: f64,
        clock: &impl Clock,
    ) {
        self.total_distance_km += distance_km;
        self.estimated_hours += hours;
        self.estimated_cost += cost;
        self.touch(clock);
    }

    /// Moves the route to [`RouteState::Running`] when its first leg starts.
    ///
    /// Re-entering while already running is a no-op, not an error; returns
    /// whether the state changed.
    ///
    /// # Errors
    ///
    /// Returns [`ShipmentDomainError::InvalidRouteTransition`] when invoked
    /// on a terminal route.
    pub fn begin(&mut self, clock: &impl Clock) -> Result<bool, ShipmentDomainError> {
        match self.state {
            RouteState::Running => Ok(false),
            RouteState::Pending => {
                self.state = RouteState::Running;
                self.touch(clock);
                Ok(true)
            }
            _ => Err(self.transition_error(RouteState::Running)),
        }
    }

    /// Moves the route to [`RouteState::Completed`] once every leg has
    /// finished, recording the aggregate real cost.
    ///
    /// # Errors
    ///
    /// Returns [`ShipmentDomainError::InvalidRouteTransition`] unless the
    /// route is currently [`RouteState::Running`].
    pub fn complete(&mut self, real_cost: f64, clock: &impl Clock) -> Result<(), ShipmentDomainError> {
        if !self.state.can_transition_to(RouteState::Completed) {
            return Err(self.transition_error(RouteState::Completed));
        }
        self.state = RouteState::Completed;
        self.real_cost = Some(real_cost);
        self.touch(clock);
        Ok(())
    }

    const fn transition_error(&self, to: RouteState) -> ShipmentDomainError {
        ShipmentDomainError::InvalidRouteTransition {
            route_id: self.id,
            from: self.state,
            to,
        }
    }

    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}
