//! In-memory repository for shipment lifecycle tests and embedding.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use crate::shipment::domain::{
    Container, ContainerId, CustomerId, Leg, LegId, LegOrder, RequestId, RouteId, Route,
    ShippingRequest, TruckId,
};
use crate::shipment::ports::{
    ShipmentRepository, ShipmentRepositoryError, ShipmentRepositoryResult,
};

/// Thread-safe in-memory shipment repository.
///
/// Every mutating call takes the single write lock, so each operation is one
/// atomic unit of work and the truck-exclusivity re-check inside
/// [`ShipmentRepository::update_leg`] cannot race the admission check.
#[derive(Debug, Clone, Default)]
pub struct InMemoryShipmentRepository {
    state: Arc<RwLock<InMemoryShipmentState>>,
}

#[derive(Debug, Default)]
struct InMemoryShipmentState {
    customers: HashSet<CustomerId>,
    containers: HashMap<ContainerId, Container>,
    requests: HashMap<RequestId, ShippingRequest>,
    routes: HashMap<RouteId, Route>,
    legs: HashMap<LegId, Leg>,
}

impl InMemoryShipmentState {
    fn active_holder(&self, truck: &TruckId, exclude: Option<LegId>) -> Option<&Leg> {
        self.legs.values().find(|leg| {
            leg.state().holds_truck()
                && leg.truck() == Some(truck)
                && exclude != Some(leg.id())
        })
    }

    fn remove_route_cascade(&mut self, route_id: RouteId) {
        self.legs.retain(|_, leg| leg.route_id() != route_id);
        self.routes.remove(&route_id);
    }
}

impl InMemoryShipmentRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a customer so request creation can validate the reference.
    ///
    /// # Errors
    ///
    /// Returns a persistence error when the state lock is poisoned.
    pub fn register_customer(&self, customer_id: CustomerId) -> ShipmentRepositoryResult<()> {
        let mut state = write_lock(&self.state)?;
        state.customers.insert(customer_id);
        Ok(())
    }
}

fn write_lock(
    state: &Arc<RwLock<InMemoryShipmentState>>,
) -> ShipmentRepositoryResult<std::sync::RwLockWriteGuard<'_, InMemoryShipmentState>> {
    state
        .write()
        .map_err(|err| ShipmentRepositoryError::persistence(std::io::Error::other(err.to_string())))
}

fn read_lock(
    state: &Arc<RwLock<InMemoryShipmentState>>,
) -> ShipmentRepositoryResult<std::sync::RwLockReadGuard<'_, InMemoryShipmentState>> {
    state
        .read()
        .map_err(|err| ShipmentRepositoryError::persistence(std::io::Error::other(err.to_string())))
}

#[async_trait]
impl ShipmentRepository for InMemoryShipmentRepository {
    async fn store_container(&self, container: &Container) -> ShipmentRepositoryResult<()> {
        let mut state = write_lock(&self.state)?;
        if state.containers.contains_key(&container.id()) {
            return Err(ShipmentRepositoryError::DuplicateContainer(container.id()));
        }
        state.containers.insert(container.id(), container.clone());
        Ok(())
    }

    async fn update_container(&self, container: &Container) -> ShipmentRepositoryResult<()> {
        let mut state = write_lock(&self.state)?;
        if !state.containers.contains_key(&container.id()) {
            return Err(ShipmentRepositoryError::ContainerNotFound(container.id()));
        }
        state.containers.insert(container.id(), container.clone());
        Ok(())
    }

    async fn find_container(
        &self,
        id: ContainerId,
    ) -> ShipmentRepositoryResult<Option<Container>> {
        let state = read_lock(&self.state)?;
        Ok(state.containers.get(&id).cloned())
    }

    async fn delete_container(&self, id: ContainerId) -> ShipmentRepositoryResult<()> {
        let mut state = write_lock(&self.state)?;
        state
            .containers
            .remove(&id)
            .map(|_| ())
            .ok_or(ShipmentRepositoryError::ContainerNotFound(id))
    }

    async fn store_request(&self, request: &ShippingRequest) -> ShipmentRepositoryResult<()> {
        let mut state = write_lock(&self.state)?;
        if state.requests.contains_key(&request.id()) {
            return Err(ShipmentRepositoryError::DuplicateRequest(request.id()));
        }
        state.requests.insert(request.id(), request.clone());
        Ok(())
    }

    async fn update_request(&self, request: &ShippingRequest) -> ShipmentRepositoryResult<()> {
        let mut state = write_lock(&self.state)?;
        if !state.requests.contains_key(&request.id()) {
            return Err(ShipmentRepositoryError::RequestNotFound(request.id()));
        }
        state.requests.insert(request.id(), request.clone());
        Ok(())
    }

    async fn find_request(
        &self,
        id: RequestId,
    ) -> ShipmentRepositoryResult<Option<ShippingRequest>> {
        let state = read_lock(&self.state)?;
        Ok(state.requests.get(&id).cloned())
    }

    async fn delete_request(&self, id: RequestId) -> ShipmentRepositoryResult<()> {
        let mut state = write_lock(&self.state)?;
        if state.requests.remove(&id).is_none() {
            return Err(ShipmentRepositoryError::RequestNotFound(id));
        }
        let owned_routes: Vec<RouteId> = state
            .routes
            .values()
            .filter(|route| route.request_id() == id)
            .map(Route::id)
            .collect();
        for route_id in owned_routes {
            state.remove_route_cascade(route_id);
        }
        Ok(())
    }

    async fn store_route(&self, route: &Route) -> ShipmentRepositoryResult<()> {
        let mut state = write_lock(&self.state)?;
        if state.routes.contains_key(&route.id()) {
            return Err(ShipmentRepositoryError::DuplicateRoute(route.id()));
        }
        state.routes.insert(route.id(), route.clone());
        Ok(())
    }

    async fn update_route(&self, route: &Route) -> ShipmentRepositoryResult<()> {
        let mut state = write_lock(&self.state)?;
        if !state.routes.contains_key(&route.id()) {
            return Err(ShipmentRepositoryError::RouteNotFound(route.id()));
        }
        state.routes.insert(route.id(), route.clone());
        Ok(())
    }

    async fn find_route(&self, id: RouteId) -> ShipmentRepositoryResult<Option<Route>> {
        let state = read_lock(&self.state)?;
        Ok(state.routes.get(&id).cloned())
    }

    async fn delete_route(&self, id: RouteId) -> ShipmentRepositoryResult<()> {
        let mut state = write_lock(&self.state)?;
        if !state.routes.contains_key(&id) {
            return Err(ShipmentRepositoryError::RouteNotFound(id));
        }
        state.remove_route_cascade(id);
        Ok(())
    }

    async fn routes_by_request(
        &self,
        request_id: RequestId,
    ) -> ShipmentRepositoryResult<Vec<Route>> {
        let state = read_lock(&self.state)?;
        let mut routes: Vec<Route> = state
            .routes
            .values()
            .filter(|route| route.request_id() == request_id)
            .cloned()
            .collect();
        routes.sort_by_key(Route::created_at);
        Ok(routes)
    }

    async fn selected_route(
        &self,
        request_id: RequestId,
    ) -> ShipmentRepositoryResult<Option<Route>> {
        let state = read_lock(&self.state)?;
        Ok(state
            .routes
            .values()
            .find(|route| route.request_id() == request_id && route.is_selected())
            .cloned())
    }

    async fn store_leg(&self, leg: &Leg) -> ShipmentRepositoryResult<()> {
        let mut state = write_lock(&self.state)?;
        if state.legs.contains_key(&leg.id()) {
            return Err(ShipmentRepositoryError::DuplicateLeg(leg.id()));
        }
        let order_taken = state
            .legs
            .values()
            .any(|entry| entry.route_id() == leg.route_id() && entry.order() == leg.order());
        if order_taken {
            return Err(ShipmentRepositoryError::DuplicateLegOrder {
                route_id: leg.route_id(),
                order: leg.order(),
            });
        }
        state.legs.insert(leg.id(), leg.clone());
        Ok(())
    }

    async fn update_leg(&self, leg: &Leg) -> ShipmentRepositoryResult<()> {
        let mut state = write_lock(&self.state)?;
        if !state.legs.contains_key(&leg.id()) {
            return Err(ShipmentRepositoryError::LegNotFound(leg.id()));
        }
        if leg.state().holds_truck() {
            if let Some(truck) = leg.truck() {
                if state.active_holder(truck, Some(leg.id())).is_some() {
                    return Err(ShipmentRepositoryError::TruckAlreadyActive(truck.clone()));
                }
            }
        }
        state.legs.insert(leg.id(), leg.clone());
        Ok(())
    }

    async fn find_leg(&self, id: LegId) -> ShipmentRepositoryResult<Option<Leg>> {
        let state = read_lock(&self.state)?;
        Ok(state.legs.get(&id).cloned())
    }

    async fn delete_leg(&self, id: LegId) -> ShipmentRepositoryResult<()> {
        let mut state = write_lock(&self.state)?;
        state
            .legs
            .remove(&id)
            .map(|_| ())
            .ok_or(ShipmentRepositoryError::LegNotFound(id))
    }

    async fn legs_by_route(&self, route_id: RouteId) -> ShipmentRepositoryResult<Vec<Leg>> {
        let state = read_lock(&self.state)?;
        let mut legs: Vec<Leg> = state
            .legs
            .values()
            .filter(|leg| leg.route_id() == route_id)
            .cloned()
            .collect();
        legs.sort_by_key(Leg::order);
        Ok(legs)
    }

    async fn leg_by_order(
        &self,
        route_id: RouteId,
        order: LegOrder,
    ) -> ShipmentRepositoryResult<Option<Leg>> {
        let state = read_lock(&self.state)?;
        Ok(state
            .legs
            .values()
            .find(|leg| leg.route_id() == route_id && leg.order() == order)
            .cloned())
    }

    async fn active_leg_for_truck(
        &self,
        truck: &TruckId,
        exclude: Option<LegId>,
    ) -> ShipmentRepositoryResult<Option<Leg>> {
        let state = read_lock(&self.state)?;
        Ok(state.active_holder(truck, exclude).cloned())
    }

    async fn customer_exists(&self, customer_id: CustomerId) -> ShipmentRepositoryResult<bool> {
        let state = read_lock(&self.state)?;
        Ok(state.customers.contains(&customer_id))
    }
}
