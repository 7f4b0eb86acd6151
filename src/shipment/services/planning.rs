//! Planning service: requests, candidate routes, and leg drafting.

use super::estimator::{CostEstimator, EstimationError};
use crate::shipment::domain::{
    CargoMetrics, ContainerId, ContainerState, CustomerId, DepositId, Leg, LegOrder, LegState,
    LegStop, RequestId, RequestState, Route, RouteId, ShipmentDomainError, ShippingRequest,
    StopKind,
};
use crate::shipment::ports::{ShipmentRepository, ShipmentRepositoryError};
use chrono::{DateTime, Duration, Utc};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Caller-supplied fields for drafting a leg within a route.
///
/// Origin and destination each take exactly one of the two location forms;
/// supplying both or neither is rejected at creation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateLegInput {
    origin_deposit: Option<DepositId>,
    origin_address: Option<String>,
    destination_deposit: Option<DepositId>,
    destination_address: Option<String>,
    planned_start: Option<DateTime<Utc>>,
    planned_end: Option<DateTime<Utc>>,
    order: Option<u32>,
}

impl CreateLegInput {
    /// Creates an empty input; location forms are set with the builders.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the origin to a registered deposit.
    #[must_use]
    pub const fn with_origin_deposit(mut self, deposit_id: DepositId) -> Self {
        self.origin_deposit = Some(deposit_id);
        self
    }

    /// Sets the origin to a free-form address.
    #[must_use]
    pub fn with_origin_address(mut self, address: impl Into<String>) -> Self {
        self.origin_address = Some(address.into());
        self
    }

    /// Sets the destination to a registered deposit.
    #[must_use]
    pub const fn with_destination_deposit(mut self, deposit_id: DepositId) -> Self {
        self.destination_deposit = Some(deposit_id);
        self
    }

    /// Sets the destination to a free-form address.
    #[must_use]
    pub fn with_destination_address(mut self, address: impl Into<String>) -> Self {
        self.destination_address = Some(address.into());
        self
    }

    /// Sets an explicit planned departure/arrival window.
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

    /// Sets an explicit position within the route; defaults to the next
    /// free position.
    #[must_use]
    pub const fn with_order(mut self, order: u32) -> Self {
        self.order = Some(order);
        self
    }
}

/// Service-level errors for planning operations.
#[derive(Debug, Error)]
pub enum PlanningError {
    /// The referenced customer is not registered.
    #[error("customer not registered: {0}")]
    CustomerNotFound(CustomerId),

    /// The referenced container does not exist.
    #[error("container not found: {0}")]
    ContainerNotFound(ContainerId),

    /// The container is mid-shipment and cannot be attached or deleted.
    #[error("container {container_id} is {state} and belongs to an active shipment")]
    ContainerUnavailable {
        /// The contested container.
        container_id: ContainerId,
        /// Its current state.
        state: ContainerState,
    },

    /// The request does not exist.
    #[error("request not found: {0}")]
    RequestNotFound(RequestId),

    /// The route does not exist.
    #[error("route not found: {0}")]
    RouteNotFound(RouteId),

    /// The request is in transit or delivered and locked against
    /// re-planning.
    #[error("request {request_id} is {state}; routes can no longer be changed")]
    RequestLocked {
        /// The locked request.
        request_id: RequestId,
        /// Its current state.
        state: RequestState,
    },

    /// The selected route has legs in execution and cannot be deleted.
    #[error("route {route_id} is selected and has {active_legs} leg(s) past estimation")]
    RouteInUse {
        /// The protected route.
        route_id: RouteId,
        /// How many legs are assigned, started, or finished.
        active_legs: usize,
    },

    /// Leg estimation failed as a business error.
    #[error(transparent)]
    Estimation(#[from] EstimationError),

    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] ShipmentDomainError),

    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] ShipmentRepositoryError),
}

/// Result type for planning service operations.
pub type PlanningResult<T> = Result<T, PlanningError>;

/// Request, route, and leg planning orchestration.
#[derive(Clone)]
pub struct PlanningService<R, C>
where
    R: ShipmentRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
    estimator: CostEstimator,
}

impl<R, C> PlanningService<R, C>
where
    R: ShipmentRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new planning service.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>, estimator: CostEstimator) -> Self {
        Self {
            repository,
            clock,
            estimator,
        }
    }

    /// Creates a draft shipping request for a container.
    ///
    /// # Errors
    ///
    /// Returns [`PlanningError::CustomerNotFound`] when the customer is not
    /// registered, [`PlanningError::ContainerNotFound`] when the container
    /// does not exist, and [`PlanningError::ContainerUnavailable`] when the
    /// container is in transit or parked at a deposit for another shipment.
    pub async fn create_request(
        &self,
        container_id: ContainerId,
        customer_id: CustomerId,
    ) -> PlanningResult<ShippingRequest> {
        if !self.repository.customer_exists(customer_id).await? {
            return Err(PlanningError::CustomerNotFound(customer_id));
        }

        let container = self
            .repository
            .find_container(container_id)
            .await?
            .ok_or(PlanningError::ContainerNotFound(container_id))?;
        if !container.state().admits_new_request() {
            return Err(PlanningError::ContainerUnavailable {
                container_id,
                state: container.state(),
            });
        }

        let request = ShippingRequest::new(container_id, customer_id, &*self.clock);
        self.repository.store_request(&request).await?;
        info!(request_id = %request.id(), %container_id, "shipping request created");
        Ok(request)
    }

    /// Cancels a draft or scheduled request.
    ///
    /// # Errors
    ///
    /// Returns [`PlanningError::RequestNotFound`] when the request does not
    /// exist and a domain transition error once execution has begun.
    pub async fn cancel_request(&self, request_id: RequestId) -> PlanningResult<ShippingRequest> {
        let mut request = self.find_request(request_id).await?;
        request.transition_to(RequestState::Cancelled, &*self.clock)?;
        self.repository.update_request(&request).await?;
        info!(%request_id, "shipping request cancelled");
        Ok(request)
    }

    /// Deletes a request together with its routes and legs.
    ///
    /// # Errors
    ///
    /// Returns [`PlanningError::RequestNotFound`] when the request does not
    /// exist and [`PlanningError::RequestLocked`] once the shipment is in
    /// transit or delivered.
    pub async fn delete_request(&self, request_id: RequestId) -> PlanningResult<()> {
        let request = self.find_request(request_id).await?;
        if request.state().is_locked() {
            return Err(PlanningError::RequestLocked {
                request_id,
                state: request.state(),
            });
        }
        self.repository.delete_request(request_id).await?;
        info!(%request_id, "shipping request deleted");
        Ok(())
    }

    /// Deletes a container record.
    ///
    /// # Errors
    ///
    /// Returns [`PlanningError::ContainerNotFound`] when the container does
    /// not exist and [`PlanningError::ContainerUnavailable`] while it
    /// belongs to an active shipment.
    pub async fn delete_container(&self, container_id: ContainerId) -> PlanningResult<()> {
        let container = self
            .repository
            .find_container(container_id)
            .await?
            .ok_or(PlanningError::ContainerNotFound(container_id))?;
        if !container.state().admits_new_request() {
            return Err(PlanningError::ContainerUnavailable {
                container_id,
                state: container.state(),
            });
        }
        self.repository.delete_container(container_id).await?;
        info!(%container_id, "container deleted");
        Ok(())
    }

    /// Creates a candidate route for a request.
    ///
    /// # Errors
    ///
    /// Returns [`PlanningError::RequestNotFound`] when the request does not
    /// exist.
    pub async fn create_route(
        &self,
        request_id: RequestId,
        name: impl Into<String> + Send,
        description: Option<String>,
    ) -> PlanningResult<Route> {
        self.find_request(request_id).await?;

        let mut route = Route::new(request_id, name, &*self.clock);
        if let Some(description) = description {
            route = route.with_description(description);
        }
        self.repository.store_route(&route).await?;
        info!(route_id = %route.id(), %request_id, "candidate route created");
        Ok(route)
    }

    /// Drafts an estimated leg within a route.
    ///
    /// The leg is estimated on creation: stop addresses are resolved, the
    /// geocoder is consulted once, and the transport cost is priced from the
    /// eligible-truck average. When no explicit order is given the leg takes
    /// the next free position.
    ///
    /// # Errors
    ///
    /// Returns [`PlanningError::RouteNotFound`] when the route does not
    /// exist, a domain validation error for malformed stops or order, and
    /// [`EstimationError::NoEligibleCarrier`] (via
    /// [`PlanningError::Estimation`]) when no registered truck can carry the
    /// cargo.
    pub async fn create_leg(&self, route_id: RouteId, input: CreateLegInput) -> PlanningResult<Leg> {
        let mut route = self
            .repository
            .find_route(route_id)
            .await?
            .ok_or(PlanningError::RouteNotFound(route_id))?;

        let origin = LegStop::from_forms(StopKind::Origin, input.origin_deposit, input.origin_address)?;
        let destination = LegStop::from_forms(
            StopKind::Destination,
            input.destination_deposit,
            input.destination_address,
        )?;

        let order = match input.order {
            Some(value) => LegOrder::new(value)?,
            None => self.next_order(route_id).await?,
        };

        let cargo = self.cargo_for_request(route.request_id()).await?;
        let estimate = self.estimator.estimate_leg(&origin, &destination, cargo).await?;

        let mut leg = Leg::new(route_id, order, origin, destination, &*self.clock)
            .with_estimate(estimate.distance_km, estimate.cost);
        let (planned_start, planned_end) = match (input.planned_start, input.planned_end) {
            (Some(start), Some(end)) => (start, end),
            _ => {
                let start = self.clock.utc();
                (start, start + Duration::minutes(estimate.duration_minutes))
            }
        };
        leg = leg.with_planned_window(planned_start, planned_end);

        self.repository.store_leg(&leg).await?;

        route.add_estimated_leg(
            leg.estimated_distance_km(),
            leg.planned_hours().unwrap_or(0.0),
            leg.estimated_cost(),
            &*self.clock,
        );
        self.repository.update_route(&route).await?;

        info!(leg_id = %leg.id(), %route_id, order = %leg.order(), "leg created");
        Ok(leg)
    }

    /// Selects a route for execution, pruning every sibling alternative.
    ///
    /// Pruning is permanent: the other candidate routes and their legs are
    /// deleted, not deselected. A draft request moves to scheduled;
    /// re-selecting while still scheduled swaps the choice without a request
    /// transition.
    ///
    /// # Errors
    ///
    /// Returns [`PlanningError::RouteNotFound`] /
    /// [`PlanningError::RequestNotFound`] for missing records and
    /// [`PlanningError::RequestLocked`] once the shipment is in transit or
    /// delivered.
    pub async fn select_route(&self, route_id: RouteId) -> PlanningResult<Route> {
        let mut route = self
            .repository
            .find_route(route_id)
            .await?
            .ok_or(PlanningError::RouteNotFound(route_id))?;
        let mut request = self.find_request(route.request_id()).await?;

        if request.state().is_locked() {
            return Err(PlanningError::RequestLocked {
                request_id: request.id(),
                state: request.state(),
            });
        }

        route.mark_selected(&*self.clock);
        self.repository.update_route(&route).await?;

        let siblings: Vec<Route> = self
            .repository
            .routes_by_request(request.id())
            .await?
            .into_iter()
            .filter(|candidate| candidate.id() != route_id)
            .collect();
        for sibling in &siblings {
            self.repository.delete_route(sibling.id()).await?;
        }
        if !siblings.is_empty() {
            info!(
                request_id = %request.id(),
                pruned = siblings.len(),
                "alternative routes pruned after selection"
            );
        }

        if request.state() == RequestState::Draft {
            request.transition_to(RequestState::Scheduled, &*self.clock)?;
            self.repository.update_request(&request).await?;
        }

        info!(%route_id, request_id = %request.id(), "route selected");
        Ok(route)
    }

    /// Deletes a candidate route together with its legs.
    ///
    /// # Errors
    ///
    /// Returns [`PlanningError::RouteNotFound`] when the route does not
    /// exist, [`PlanningError::RequestLocked`] when the owning request is in
    /// transit or delivered, and [`PlanningError::RouteInUse`] when the
    /// route is selected and any of its legs has progressed past
    /// estimation.
    pub async fn delete_route(&self, route_id: RouteId) -> PlanningResult<()> {
        let route = self
            .repository
            .find_route(route_id)
            .await?
            .ok_or(PlanningError::RouteNotFound(route_id))?;
        let request = self.find_request(route.request_id()).await?;

        if request.state().is_locked() {
            return Err(PlanningError::RequestLocked {
                request_id: request.id(),
                state: request.state(),
            });
        }

        if route.is_selected() {
            let active_legs = self
                .repository
                .legs_by_route(route_id)
                .await?
                .iter()
                .filter(|leg| leg.state() != LegState::Estimated)
                .count();
            if active_legs > 0 {
                return Err(PlanningError::RouteInUse {
                    route_id,
                    active_legs,
                });
            }
        }

        self.repository.delete_route(route_id).await?;
        info!(%route_id, "route deleted");
        Ok(())
    }

    async fn find_request(&self, request_id: RequestId) -> PlanningResult<ShippingRequest> {
        self.repository
            .find_request(request_id)
            .await?
            .ok_or(PlanningError::RequestNotFound(request_id))
    }

    async fn next_order(&self, route_id: RouteId) -> PlanningResult<LegOrder> {
        let legs = self.repository.legs_by_route(route_id).await?;
        Ok(legs
            .iter()
            .map(|leg| leg.order())
            .max()
            .map_or(LegOrder::FIRST, LegOrder::next))
    }

    async fn cargo_for_request(&self, request_id: RequestId) -> PlanningResult<CargoMetrics> {
        let request = self.find_request(request_id).await?;
        let container = self
            .repository
            .find_container(request.container_id())
            .await?
            .ok_or(PlanningError::ContainerNotFound(request.container_id()))?;
        Ok(container.estimation_metrics())
    }
}
