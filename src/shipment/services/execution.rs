//! Execution service: truck assignment, leg start/finish, and the state
//! cascades they drive.

use super::admission::{AdmissionError, AdmissionPolicy};
use super::consolidation::consolidate;
use super::dwell::dwell_before;
use super::pricing::PricingConfig;
use crate::shipment::domain::{
    Container, ContainerEvent, ContainerId, ContainerState, DepositId, Leg, LegId, LegOrder,
    LegState, RequestId, RequestState, Route, RouteId, ShipmentDomainError, ShippingRequest,
    TruckId,
};
use crate::shipment::ports::{
    DepositPort, FleetPort, ShipmentRepository, ShipmentRepositoryError,
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Where a request's container currently is, derived from container and leg
/// state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerPosition {
    /// Still at the customer's origin; no leg has started.
    AtOrigin,
    /// Moving on a started leg of the selected route.
    InTransit {
        /// The started leg, when one can be identified.
        leg_id: Option<LegId>,
        /// Its position within the route.
        order: Option<LegOrder>,
    },
    /// Parked at a deposit between legs.
    AtDeposit {
        /// The deposit holding the container.
        deposit_id: DepositId,
    },
    /// Delivered at the final destination.
    Delivered,
}

/// Service-level errors for execution operations.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// The leg does not exist.
    #[error("leg not found: {0}")]
    LegNotFound(LegId),

    /// The route does not exist.
    #[error("route not found: {0}")]
    RouteNotFound(RouteId),

    /// The request does not exist.
    #[error("request not found: {0}")]
    RequestNotFound(RequestId),

    /// The container does not exist.
    #[error("container not found: {0}")]
    ContainerNotFound(ContainerId),

    /// The leg's route has not been selected for execution.
    #[error("leg {leg_id} cannot start: route {route_id} is not the selected route")]
    RouteNotSelected {
        /// The leg that was refused.
        leg_id: LegId,
        /// Its unselected route.
        route_id: RouteId,
    },

    /// The preceding leg in the route has not finished.
    #[error(
        "leg {leg_id} (order {order}) cannot start: leg at order {predecessor_order} is {predecessor_state}, not finished"
    )]
    PredecessorNotFinished {
        /// The leg that was refused.
        leg_id: LegId,
        /// Its position.
        order: LegOrder,
        /// The unfinished predecessor's position.
        predecessor_order: LegOrder,
        /// The predecessor's current state.
        predecessor_state: LegState,
    },

    /// Truck admission was refused.
    #[error(transparent)]
    Admission(#[from] AdmissionError),

    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] ShipmentDomainError),

    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] ShipmentRepositoryError),
}

/// Result type for execution service operations.
pub type ExecutionResult<T> = Result<T, ExecutionError>;

/// Orchestrates leg execution and the route/request/container cascades.
pub struct ExecutionService<R, C>
where
    R: ShipmentRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
    admission: AdmissionPolicy<R>,
    fleet: Option<Arc<dyn FleetPort>>,
    deposits: Option<Arc<dyn DepositPort>>,
    pricing: PricingConfig,
}

impl<R, C> ExecutionService<R, C>
where
    R: ShipmentRepository,
    C: Clock + Send + Sync,
{
    /// Creates an execution service with no collaborators wired; fleet and
    /// deposit lookups degrade to the configured fallbacks until ports are
    /// attached.
    #[must_use]
    pub fn new(repository: Arc<R>, clock: Arc<C>, pricing: PricingConfig) -> Self {
        Self {
            admission: AdmissionPolicy::new(Arc::clone(&repository)),
            repository,
            clock,
            fleet: None,
            deposits: None,
            pricing,
        }
    }

    /// Attaches the fleet registry, used for admission capacity checks and
    /// real-cost tariffs.
    #[must_use]
    pub fn with_fleet(mut self, fleet: Arc<dyn FleetPort>) -> Self {
        self.admission = self.admission.with_fleet(Arc::clone(&fleet));
        self.fleet = Some(fleet);
        self
    }

    /// Attaches the deposit registry, used for dwell tariffs.
    #[must_use]
    pub fn with_deposits(mut self, deposits: Arc<dyn DepositPort>) -> Self {
        self.deposits = Some(deposits);
        self
    }

    /// Binds a truck to an estimated leg after admission control.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError::Admission`] when exclusivity, container
    /// data, or capacity checks refuse the truck, and a domain transition
    /// error unless the leg is currently estimated.
    pub async fn assign_truck(&self, leg_id: LegId, truck: TruckId) -> ExecutionResult<Leg> {
        let mut leg = self.find_leg(leg_id).await?;
        let (_, _, container) = self.shipment_of(&leg).await?;

        self.admission.authorize(&leg, &truck, &container).await?;
        leg.assign_truck(truck.clone(), &*self.clock)?;
        match self.repository.update_leg(&leg).await {
            Ok(()) => {}
            // The uniqueness guarantee closes the window between the
            // admission check and this write; surface it as the same
            // admission refusal the check would have produced.
            Err(ShipmentRepositoryError::TruckAlreadyActive(plate)) => {
                let holder = self
                    .repository
                    .active_leg_for_truck(&plate, Some(leg_id))
                    .await?
                    .map_or(leg_id, |winner| winner.id());
                return Err(ExecutionError::Admission(AdmissionError::TruckInUse {
                    truck: plate,
                    holder,
                }));
            }
            Err(err) => return Err(err.into()),
        }

        info!(%leg_id, truck = %leg.truck().map_or("-", TruckId::as_str), "truck assigned");
        Ok(leg)
    }

    /// Starts an assigned leg, stamping the real departure time and
    /// cascading state to the container, route, and request.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError::RouteNotSelected`] when the owning route is
    /// not the request's selected route,
    /// [`ExecutionError::PredecessorNotFinished`] when an earlier leg is
    /// still open, and a domain transition error unless the leg is currently
    /// assigned.
    pub async fn start_leg(
        &self,
        leg_id: LegId,
        odometer_start: Option<f64>,
    ) -> ExecutionResult<Leg> {
        let mut leg = self.find_leg(leg_id).await?;
        let (route, mut request, mut container) = self.shipment_of(&leg).await?;

        if !route.is_selected() {
            return Err(ExecutionError::RouteNotSelected {
                leg_id,
                route_id: route.id(),
            });
        }

        let predecessor = match leg.order().predecessor() {
            Some(order) => self.repository.leg_by_order(route.id(), order).await?,
            None => None,
        };
        if let Some(previous) = &predecessor {
            if previous.state() != LegState::Finished {
                return Err(ExecutionError::PredecessorNotFinished {
                    leg_id,
                    order: leg.order(),
                    predecessor_order: previous.order(),
                    predecessor_state: previous.state(),
                });
            }
        }

        leg.start(odometer_start, &*self.clock)?;

        if let (Some(previous), Some(started_at)) = (&predecessor, leg.actual_start()) {
            if let Some(pending) = dwell_before(previous, started_at) {
                let rate = self.dwell_rate(pending.deposit_id).await;
                leg.record_dwell(pending.hours, pending.hours * rate, &*self.clock);
                info!(
                    %leg_id,
                    deposit_id = %pending.deposit_id,
                    hours = pending.hours,
                    "dwell recorded before leg start"
                );
            }
        }

        self.repository.update_leg(&leg).await?;

        container.apply(ContainerEvent::LegStarted, &*self.clock);
        self.repository.update_container(&container).await?;

        let mut running_route = route;
        if running_route.begin(&*self.clock)? {
            self.repository.update_route(&running_route).await?;
        }

        if request.state() == RequestState::Scheduled {
            request.transition_to(RequestState::InTransit, &*self.clock)?;
            self.repository.update_request(&request).await?;
        }

        info!(%leg_id, order = %leg.order(), "leg started");
        Ok(leg)
    }

    /// Finishes a started leg, recording actuals and cascading: the last
    /// leg delivers the container and consolidates the request; an
    /// intermediate leg ending at a deposit parks the container there.
    ///
    /// # Errors
    ///
    /// Returns a domain transition error unless the leg is currently
    /// started.
    pub async fn finish_leg(
        &self,
        leg_id: LegId,
        finished_at: Option<DateTime<Utc>>,
        odometer_end: Option<f64>,
    ) -> ExecutionResult<Leg> {
        let mut leg = self.find_leg(leg_id).await?;
        let (route, mut request, mut container) = self.shipment_of(&leg).await?;

        leg.finish(finished_at, odometer_end, &*self.clock)?;

        let distance_km = match leg.odometer_delta() {
            Some(delta) => delta,
            None => {
                warn!(
                    %leg_id,
                    estimated_km = leg.estimated_distance_km(),
                    "odometer readings unusable, falling back to estimated distance"
                );
                leg.estimated_distance_km()
            }
        };
        let rate = self.truck_rate(leg.truck()).await;
        leg.record_actuals(distance_km, distance_km * rate, &*self.clock);

        self.repository.update_leg(&leg).await?;

        let legs = self.repository.legs_by_route(route.id()).await?;
        let highest_order = legs.iter().map(Leg::order).max().unwrap_or(leg.order());

        if leg.order() == highest_order {
            container.apply(ContainerEvent::DeliveryCompleted, &*self.clock);
            self.repository.update_container(&container).await?;

            let totals = consolidate(&legs);
            request.record_totals(totals, &*self.clock)?;
            self.repository.update_request(&request).await?;

            let all_finished = legs.iter().all(|entry| entry.state() == LegState::Finished);
            if all_finished {
                let mut completed_route = route;
                completed_route.complete(totals.real_cost, &*self.clock)?;
                self.repository.update_route(&completed_route).await?;
            }

            info!(
                request_id = %request.id(),
                real_cost = totals.real_cost,
                estimated_cost = totals.estimated_cost,
                "shipment delivered and consolidated"
            );
        } else if let Some(deposit_id) = leg.destination().deposit_id() {
            container.apply(ContainerEvent::ArrivedAtDeposit(deposit_id), &*self.clock);
            self.repository.update_container(&container).await?;
            info!(%leg_id, %deposit_id, "container parked at deposit");
        }

        info!(%leg_id, order = %leg.order(), "leg finished");
        Ok(leg)
    }

    /// Reports where a request's container currently is.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError::RequestNotFound`] /
    /// [`ExecutionError::ContainerNotFound`] for missing records, and a
    /// domain error when a persisted container violates the deposit
    /// invariant.
    pub async fn container_position(
        &self,
        request_id: RequestId,
    ) -> ExecutionResult<ContainerPosition> {
        let request = self
            .repository
            .find_request(request_id)
            .await?
            .ok_or(ExecutionError::RequestNotFound(request_id))?;
        let container = self
            .repository
            .find_container(request.container_id())
            .await?
            .ok_or_else(|| ExecutionError::ContainerNotFound(request.container_id()))?;

        match container.state() {
            ContainerState::Origin | ContainerState::Available => Ok(ContainerPosition::AtOrigin),
            ContainerState::Delivered => Ok(ContainerPosition::Delivered),
            ContainerState::InDeposit => {
                let deposit_id = container.current_deposit().ok_or(
                    ShipmentDomainError::DepositRefRequired(container.id()),
                )?;
                Ok(ContainerPosition::AtDeposit { deposit_id })
            }
            ContainerState::InTransit => {
                let current = match self.repository.selected_route(request_id).await? {
                    Some(route) => self
                        .repository
                        .legs_by_route(route.id())
                        .await?
                        .into_iter()
                        .find(|leg| leg.state() == LegState::Started),
                    None => None,
                };
                Ok(ContainerPosition::InTransit {
                    leg_id: current.as_ref().map(Leg::id),
                    order: current.as_ref().map(Leg::order),
                })
            }
        }
    }

    async fn find_leg(&self, leg_id: LegId) -> ExecutionResult<Leg> {
        self.repository
            .find_leg(leg_id)
            .await?
            .ok_or(ExecutionError::LegNotFound(leg_id))
    }

    /// Walks leg -> route -> request -> container.
    async fn shipment_of(
        &self,
        leg: &Leg,
    ) -> ExecutionResult<(Route, ShippingRequest, Container)> {
        let route = self
            .repository
            .find_route(leg.route_id())
            .await?
            .ok_or_else(|| ExecutionError::RouteNotFound(leg.route_id()))?;
        let request = self
            .repository
            .find_request(route.request_id())
            .await?
            .ok_or_else(|| ExecutionError::RequestNotFound(route.request_id()))?;
        let container = self
            .repository
            .find_container(request.container_id())
            .await?
            .ok_or_else(|| ExecutionError::ContainerNotFound(request.container_id()))?;
        Ok((route, request, container))
    }

    /// Per-kilometre tariff of the bound truck, or the configured default
    /// when the fleet registry cannot answer.
    async fn truck_rate(&self, truck: Option<&TruckId>) -> f64 {
        let Some(truck) = truck else {
            warn!("leg finished without a bound truck, using default tariff");
            return self.pricing.default_rate_per_km;
        };
        let Some(fleet) = &self.fleet else {
            warn!(%truck, "fleet registry not configured, using default tariff");
            return self.pricing.default_rate_per_km;
        };
        match fleet.get_truck(truck).await {
            Ok(record) => record.cost_per_km,
            Err(err) => {
                warn!(%truck, error = %err, "truck lookup failed, using default tariff");
                self.pricing.default_rate_per_km
            }
        }
    }

    /// Hourly dwell tariff for a deposit: its explicit hourly rate, else the
    /// daily rate over 24, else zero with a warning.
    async fn dwell_rate(&self, deposit_id: DepositId) -> f64 {
        let Some(deposits) = &self.deposits else {
            warn!(%deposit_id, "deposit registry not configured, dwell priced at zero");
            return 0.0;
        };
        match deposits.get_deposit(deposit_id).await {
            Ok(deposit) => deposit.effective_hourly_rate().unwrap_or_else(|| {
                warn!(%deposit_id, "deposit publishes no dwell tariff, dwell priced at zero");
                0.0
            }),
            Err(err) => {
                warn!(%deposit_id, error = %err, "deposit lookup failed, dwell priced at zero");
                0.0
            }
        }
    }
}
