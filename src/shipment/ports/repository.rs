//! Repository port for shipment persistence, lookup, and deletion.

use crate::shipment::domain::{
    Container, ContainerId, CustomerId, Leg, LegId, LegOrder, RequestId, RouteId, Route,
    ShippingRequest, TruckId,
};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for shipment repository operations.
pub type ShipmentRepositoryResult<T> = Result<T, ShipmentRepositoryError>;

/// Shipment persistence contract.
///
/// Each mutating call is one atomic unit of work; implementations must never
/// expose a half-applied state transition. Deleting a route also deletes its
/// legs; containers and requests are never cascade-deleted.
#[async_trait]
pub trait ShipmentRepository: Send + Sync {
    /// Stores a new container.
    ///
    /// # Errors
    ///
    /// Returns [`ShipmentRepositoryError::DuplicateContainer`] when the
    /// identifier already exists.
    async fn store_container(&self, container: &Container) -> ShipmentRepositoryResult<()>;

    /// Persists changes to an existing container.
    ///
    /// # Errors
    ///
    /// Returns [`ShipmentRepositoryError::ContainerNotFound`] when the
    /// container does not exist.
    async fn update_container(&self, container: &Container) -> ShipmentRepositoryResult<()>;

    /// Finds a container by identifier; `None` when it does not exist.
    async fn find_container(&self, id: ContainerId)
    -> ShipmentRepositoryResult<Option<Container>>;

    /// Deletes a container.
    ///
    /// # Errors
    ///
    /// Returns [`ShipmentRepositoryError::ContainerNotFound`] when the
    /// container does not exist.
    async fn delete_container(&self, id: ContainerId) -> ShipmentRepositoryResult<()>;

    /// Stores a new shipping request.
    ///
    /// # Errors
    ///
    /// Returns [`ShipmentRepositoryError::DuplicateRequest`] when the
    /// identifier already exists.
    async fn store_request(&self, request: &ShippingRequest) -> ShipmentRepositoryResult<()>;

    /// Persists changes to an existing shipping request.
    ///
    /// # Errors
    ///
    /// Returns [`ShipmentRepositoryError::RequestNotFound`] when the request
    /// does not exist.
    async fn update_request(&self, request: &ShippingRequest) -> ShipmentRepositoryResult<()>;

    /// Finds a shipping request by identifier; `None` when it does not
    /// exist.
    async fn find_request(
        &self,
        id: RequestId,
    ) -> ShipmentRepositoryResult<Option<ShippingRequest>>;

    /// Deletes a shipping request together with its routes and legs.
    ///
    /// # Errors
    ///
    /// Returns [`ShipmentRepositoryError::RequestNotFound`] when the request
    /// does not exist.
    async fn delete_request(&self, id: RequestId) -> ShipmentRepositoryResult<()>;

    /// Stores a new route.
    ///
    /// # Errors
    ///
    /// Returns [`ShipmentRepositoryError::DuplicateRoute`] when the
    /// identifier already exists.
    async fn store_route(&self, route: &Route) -> ShipmentRepositoryResult<()>;

    /// Persists changes to an existing route.
    ///
    /// # Errors
    ///
    /// Returns [`ShipmentRepositoryError::RouteNotFound`] when the route
    /// does not exist.
    async fn update_route(&self, route: &Route) -> ShipmentRepositoryResult<()>;

    /// Finds a route by identifier; `None` when it does not exist.
    async fn find_route(&self, id: RouteId) -> ShipmentRepositoryResult<Option<Route>>;

    /// Deletes a route together with its legs.
    ///
    /// # Errors
    ///
    /// Returns [`ShipmentRepositoryError::RouteNotFound`] when the route
    /// does not exist.
    async fn delete_route(&self, id: RouteId) -> ShipmentRepositoryResult<()>;

    /// Returns all routes belonging to the given request.
    async fn routes_by_request(&self, request_id: RequestId)
    -> ShipmentRepositoryResult<Vec<Route>>;

    /// Returns the request's selected route, if one has been chosen.
    async fn selected_route(
        &self,
        request_id: RequestId,
    ) -> ShipmentRepositoryResult<Option<Route>>;

    /// Stores a new leg.
    ///
    /// # Errors
    ///
    /// Returns [`ShipmentRepositoryError::DuplicateLeg`] when the identifier
    /// already exists, or [`ShipmentRepositoryError::DuplicateLegOrder`]
    /// when the route already holds a leg at the same order.
    async fn store_leg(&self, leg: &Leg) -> ShipmentRepositoryResult<()>;

    /// Persists changes to an existing leg.
    ///
    /// # Errors
    ///
    /// Returns [`ShipmentRepositoryError::LegNotFound`] when the leg does
    /// not exist, or [`ShipmentRepositoryError::TruckAlreadyActive`] when
    /// the update would bind a truck that another assigned or started leg
    /// already holds (backed by a uniqueness guarantee, closing the
    /// check-then-act window).
    async fn update_leg(&self, leg: &Leg) -> ShipmentRepositoryResult<()>;

    /// Finds a leg by identifier; `None` when it does not exist.
    async fn find_leg(&self, id: LegId) -> ShipmentRepositoryResult<Option<Leg>>;

    /// Deletes a leg.
    ///
    /// # Errors
    ///
    /// Returns [`ShipmentRepositoryError::LegNotFound`] when the leg does
    /// not exist.
    async fn delete_leg(&self, id: LegId) -> ShipmentRepositoryResult<()>;

    /// Returns all legs of the given route, ordered by position.
    async fn legs_by_route(&self, route_id: RouteId) -> ShipmentRepositoryResult<Vec<Leg>>;

    /// Finds the leg at a given position within a route; `None` when the
    /// position is vacant.
    async fn leg_by_order(
        &self,
        route_id: RouteId,
        order: LegOrder,
    ) -> ShipmentRepositoryResult<Option<Leg>>;

    /// Finds a leg currently holding the truck exclusively (assigned or
    /// started), excluding `exclude` when given.
    async fn active_leg_for_truck(
        &self,
        truck: &TruckId,
        exclude: Option<LegId>,
    ) -> ShipmentRepositoryResult<Option<Leg>>;

    /// Returns whether a customer with the given identifier is registered.
    async fn customer_exists(&self, customer_id: CustomerId) -> ShipmentRepositoryResult<bool>;
}

/// Errors returned by shipment repository implementations.
#[derive(Debug, Clone, Error)]
pub enum ShipmentRepositoryError {
    /// A container with the same identifier already exists.
    #[error("duplicate container identifier: {0}")]
    DuplicateContainer(ContainerId),

    /// The container was not found.
    #[error("container not found: {0}")]
    ContainerNotFound(ContainerId),

    /// A request with the same identifier already exists.
    #[error("duplicate request identifier: {0}")]
    DuplicateRequest(RequestId),

    /// The request was not found.
    #[error("request not found: {0}")]
    RequestNotFound(RequestId),

    /// A route with the same identifier already exists.
    #[error("duplicate route identifier: {0}")]
    DuplicateRoute(RouteId),

    /// The route was not found.
    #[error("route not found: {0}")]
    RouteNotFound(RouteId),

    /// A leg with the same identifier already exists.
    #[error("duplicate leg identifier: {0}")]
    DuplicateLeg(LegId),

    /// The route already holds a leg at the same position.
    #[error("route {route_id} already holds a leg at order {order}")]
    DuplicateLegOrder {
        /// Route the conflicting leg belongs to.
        route_id: RouteId,
        /// The occupied position.
        order: LegOrder,
    },

    /// The leg was not found.
    #[error("leg not found: {0}")]
    LegNotFound(LegId),

    /// Another assigned or started leg already holds the truck.
    #[error("truck {0} is already bound to an active leg")]
    TruckAlreadyActive(TruckId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl ShipmentRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
