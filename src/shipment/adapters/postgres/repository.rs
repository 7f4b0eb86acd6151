//! `PostgreSQL` repository implementation for shipment lifecycle storage.

use super::{
    models::{ContainerRow, LegRow, RequestRow, RouteRow},
    schema::{containers, customers, legs, routes, shipping_requests},
};
use crate::shipment::domain::{
    Container, ContainerId, ContainerState, CustomerId, DepositId, Leg, LegId, LegOrder,
    LegState, LegStop, PersistedContainerData, PersistedLegData, PersistedRequestData,
    PersistedRouteData, RequestId, RequestState, Route, RouteId, RouteState, ShipmentTotals,
    ShippingRequest, StopKind, TruckId,
};
use crate::shipment::ports::{
    ShipmentRepository, ShipmentRepositoryError, ShipmentRepositoryResult,
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type used by shipment adapters.
pub type ShipmentPgPool = Pool<ConnectionManager<PgConnection>>;

/// Unique index keeping leg orders dense within a route.
const LEG_ORDER_CONSTRAINT: &str = "idx_legs_route_order_unique";

/// Partial unique index allowing one assigned/started leg per truck.
const ACTIVE_TRUCK_CONSTRAINT: &str = "idx_legs_active_truck_unique";

/// `PostgreSQL`-backed shipment repository.
#[derive(Debug, Clone)]
pub struct PostgresShipmentRepository {
    pool: ShipmentPgPool,
}

impl PostgresShipmentRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: ShipmentPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> ShipmentRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> ShipmentRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(ShipmentRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(ShipmentRepositoryError::persistence)?
    }
}

#[async_trait]
impl ShipmentRepository for PostgresShipmentRepository {
    async fn store_container(&self, container: &Container) -> ShipmentRepositoryResult<()> {
        let row = container_to_row(container);
        let container_id = container.id();
        self.run_blocking(move |connection| {
            diesel::insert_into(containers::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        ShipmentRepositoryError::DuplicateContainer(container_id)
                    }
                    _ => ShipmentRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn update_container(&self, container: &Container) -> ShipmentRepositoryResult<()> {
        let row = container_to_row(container);
        let container_id = container.id();
        self.run_blocking(move |connection| {
            let updated = diesel::update(containers::table.find(container_id.into_inner()))
                .set(&row)
                .execute(connection)
                .map_err(ShipmentRepositoryError::persistence)?;
            if updated == 0 {
                return Err(ShipmentRepositoryError::ContainerNotFound(container_id));
            }
            Ok(())
        })
        .await
    }

    async fn find_container(
        &self,
        id: ContainerId,
    ) -> ShipmentRepositoryResult<Option<Container>> {
        self.run_blocking(move |connection| {
            let row = containers::table
                .find(id.into_inner())
                .select(ContainerRow::as_select())
                .first::<ContainerRow>(connection)
                .optional()
                .map_err(ShipmentRepositoryError::persistence)?;
            row.map(row_to_container).transpose()
        })
        .await
    }

    async fn delete_container(&self, id: ContainerId) -> ShipmentRepositoryResult<()> {
        self.run_blocking(move |connection| {
            let deleted = diesel::delete(containers::table.find(id.into_inner()))
                .execute(connection)
                .map_err(ShipmentRepositoryError::persistence)?;
            if deleted == 0 {
                return Err(ShipmentRepositoryError::ContainerNotFound(id));
            }
            Ok(())
        })
        .await
    }

    async fn store_request(&self, request: &ShippingRequest) -> ShipmentRepositoryResult<()> {
        let row = request_to_row(request);
        let request_id = request.id();
        self.run_blocking(move |connection| {
            diesel::insert_into(shipping_requests::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        ShipmentRepositoryError::DuplicateRequest(request_id)
                    }
                    _ => ShipmentRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn update_request(&self, request: &ShippingRequest) -> ShipmentRepositoryResult<()> {
        let row = request_to_row(request);
        let request_id = request.id();
        self.run_blocking(move |connection| {
            let updated = diesel::update(shipping_requests::table.find(request_id.into_inner()))
                .set(&row)
                .execute(connection)
                .map_err(ShipmentRepositoryError::persistence)?;
            if updated == 0 {
                return Err(ShipmentRepositoryError::RequestNotFound(request_id));
            }
            Ok(())
        })
        .await
    }

    async fn find_request(
        &self,
        id: RequestId,
    ) -> ShipmentRepositoryResult<Option<ShippingRequest>> {
        self.run_blocking(move |connection| {
            let row = shipping_requests::table
                .find(id.into_inner())
                .select(RequestRow::as_select())
                .first::<RequestRow>(connection)
                .optional()
                .map_err(ShipmentRepositoryError::persistence)?;
            row.map(row_to_request).transpose()
        })
        .await
    }

    async fn delete_request(&self, id: RequestId) -> ShipmentRepositoryResult<()> {
        self.run_blocking(move |connection| {
            let deleted = connection
                .transaction::<usize, DieselError, _>(|connection| {
                    let owned_routes: Vec<uuid::Uuid> = routes::table
                        .filter(routes::request_id.eq(id.into_inner()))
                        .select(routes::id)
                        .load(connection)?;
                    diesel::delete(legs::table.filter(legs::route_id.eq_any(owned_routes)))
                        .execute(connection)?;
                    diesel::delete(routes::table.filter(routes::request_id.eq(id.into_inner())))
                        .execute(connection)?;
                    diesel::delete(shipping_requests::table.find(id.into_inner()))
                        .execute(connection)
                })
                .map_err(ShipmentRepositoryError::persistence)?;
            if deleted == 0 {
                return Err(ShipmentRepositoryError::RequestNotFound(id));
            }
            Ok(())
        })
        .await
    }

    async fn store_route(&self, route: &Route) -> ShipmentRepositoryResult<()> {
        let row = route_to_row(route);
        let route_id = route.id();
        self.run_blocking(move |connection| {
            diesel::insert_into(routes::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        ShipmentRepositoryError::DuplicateRoute(route_id)
                    }
                    _ => ShipmentRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn update_route(&self, route: &Route) -> ShipmentRepositoryResult<()> {
        let row = route_to_row(route);
        let route_id = route.id();
        self.run_blocking(move |connection| {
            let updated = diesel::update(routes::table.find(route_id.into_inner()))
                .set(&row)
                .execute(connection)
                .map_err(ShipmentRepositoryError::persistence)?;
            if updated == 0 {
                return Err(ShipmentRepositoryError::RouteNotFound(route_id));
            }
            Ok(())
        })
        .await
    }

    async fn find_route(&self, id: RouteId) -> ShipmentRepositoryResult<Option<Route>> {
        self.run_blocking(move |connection| {
            let row = routes::table
                .find(id.into_inner())
                .select(RouteRow::as_select())
                .first::<RouteRow>(connection)
                .optional()
                .map_err(ShipmentRepositoryError::persistence)?;
            row.map(row_to_route).transpose()
        })
        .await
    }

    async fn delete_route(&self, id: RouteId) -> ShipmentRepositoryResult<()> {
        self.run_blocking(move |connection| {
            let deleted = connection
                .transaction::<usize, DieselError, _>(|connection| {
                    diesel::delete(legs::table.filter(legs::route_id.eq(id.into_inner())))
                        .execute(connection)?;
                    diesel::delete(routes::table.find(id.into_inner())).execute(connection)
                })
                .map_err(ShipmentRepositoryError::persistence)?;
            if deleted == 0 {
                return Err(ShipmentRepositoryError::RouteNotFound(id));
            }
            Ok(())
        })
        .await
    }

    async fn routes_by_request(
        &self,
        request_id: RequestId,
    ) -> ShipmentRepositoryResult<Vec<Route>> {
        self.run_blocking(move |connection| {
            let rows = routes::table
                .filter(routes::request_id.eq(request_id.into_inner()))
                .order(routes::created_at.asc())
                .select(RouteRow::as_select())
                .load::<RouteRow>(connection)
                .map_err(ShipmentRepositoryError::persistence)?;
            rows.into_iter().map(row_to_route).collect()
        })
        .await
    }

    async fn selected_route(
        &self,
        request_id: RequestId,
    ) -> ShipmentRepositoryResult<Option<Route>> {
        self.run_blocking(move |connection| {
            let row = routes::table
                .filter(routes::request_id.eq(request_id.into_inner()))
                .filter(routes::selected.eq(true))
                .select(RouteRow::as_select())
                .first::<RouteRow>(connection)
                .optional()
                .map_err(ShipmentRepositoryError::persistence)?;
            row.map(row_to_route).transpose()
        })
        .await
    }

    async fn store_leg(&self, leg: &Leg) -> ShipmentRepositoryResult<()> {
        let row = leg_to_row(leg)?;
        let leg_id = leg.id();
        let route_id = leg.route_id();
        let order = leg.order();
        self.run_blocking(move |connection| {
            diesel::insert_into(legs::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
                        if is_constraint(info.as_ref(), LEG_ORDER_CONSTRAINT) =>
                    {
                        ShipmentRepositoryError::DuplicateLegOrder { route_id, order }
                    }
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        ShipmentRepositoryError::DuplicateLeg(leg_id)
                    }
                    _ => ShipmentRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn update_leg(&self, leg: &Leg) -> ShipmentRepositoryResult<()> {
        let row = leg_to_row(leg)?;
        let leg_id = leg.id();
        let truck = leg.truck().cloned();
        self.run_blocking(move |connection| {
            let updated = diesel::update(legs::table.find(leg_id.into_inner()))
                .set(&row)
                .execute(connection)
                .map_err(|err| match (err, &truck) {
                    (
                        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info),
                        Some(truck),
                    ) if is_constraint(info.as_ref(), ACTIVE_TRUCK_CONSTRAINT) => {
                        ShipmentRepositoryError::TruckAlreadyActive(truck.clone())
                    }
                    (err, _) => ShipmentRepositoryError::persistence(err),
                })?;
            if updated == 0 {
                return Err(ShipmentRepositoryError::LegNotFound(leg_id));
            }
            Ok(())
        })
        .await
    }

    async fn find_leg(&self, id: LegId) -> ShipmentRepositoryResult<Option<Leg>> {
        self.run_blocking(move |connection| {
            let row = legs::table
                .find(id.into_inner())
                .select(LegRow::as_select())
                .first::<LegRow>(connection)
                .optional()
                .map_err(ShipmentRepositoryError::persistence)?;
            row.map(row_to_leg).transpose()
        })
        .await
    }

    async fn delete_leg(&self, id: LegId) -> ShipmentRepositoryResult<()> {
        self.run_blocking(move |connection| {
            let deleted = diesel::delete(legs::table.find(id.into_inner()))
                .execute(connection)
                .map_err(ShipmentRepositoryError::persistence)?;
            if deleted == 0 {
                return Err(ShipmentRepositoryError::LegNotFound(id));
            }
            Ok(())
        })
        .await
    }

    async fn legs_by_route(&self, route_id: RouteId) -> ShipmentRepositoryResult<Vec<Leg>> {
        self.run_blocking(move |connection| {
            let rows = legs::table
                .filter(legs::route_id.eq(route_id.into_inner()))
                .order(legs::leg_order.asc())
                .select(LegRow::as_select())
                .load::<LegRow>(connection)
                .map_err(ShipmentRepositoryError::persistence)?;
            rows.into_iter().map(row_to_leg).collect()
        })
        .await
    }

    async fn leg_by_order(
        &self,
        route_id: RouteId,
        order: LegOrder,
    ) -> ShipmentRepositoryResult<Option<Leg>> {
        let order_value = i32::try_from(order.value());
        self.run_blocking(move |connection| {
            let order_value = order_value.map_err(ShipmentRepositoryError::persistence)?;
            let row = legs::table
                .filter(legs::route_id.eq(route_id.into_inner()))
                .filter(legs::leg_order.eq(order_value))
                .select(LegRow::as_select())
                .first::<LegRow>(connection)
                .optional()
                .map_err(ShipmentRepositoryError::persistence)?;
            row.map(row_to_leg).transpose()
        })
        .await
    }

    async fn active_leg_for_truck(
        &self,
        truck: &TruckId,
        exclude: Option<LegId>,
    ) -> ShipmentRepositoryResult<Option<Leg>> {
        let plate = truck.as_str().to_owned();
        self.run_blocking(move |connection| {
            let mut query = legs::table
                .filter(legs::truck_plate.eq(plate))
                .filter(legs::state.eq_any([
                    LegState::Assigned.as_str(),
                    LegState::Started.as_str(),
                ]))
                .into_boxed();
            if let Some(exclude) = exclude {
                query = query.filter(legs::id.ne(exclude.into_inner()));
            }
            let row = query
                .select(LegRow::as_select())
                .first::<LegRow>(connection)
                .optional()
                .map_err(ShipmentRepositoryError::persistence)?;
            row.map(row_to_leg).transpose()
        })
        .await
    }

    async fn customer_exists(&self, customer_id: CustomerId) -> ShipmentRepositoryResult<bool> {
        self.run_blocking(move |connection| {
            diesel::select(diesel::dsl::exists(
                customers::table.filter(customers::id.eq(customer_id.into_inner())),
            ))
            .get_result::<bool>(connection)
            .map_err(ShipmentRepositoryError::persistence)
        })
        .await
    }
}

fn is_constraint(info: &dyn DatabaseErrorInformation, name: &str) -> bool {
    info.constraint_name().is_some_and(|found| found == name)
}

/// Converts a domain container to its row representation.
fn container_to_row(container: &Container) -> ContainerRow {
    ContainerRow {
        id: container.id().into_inner(),
        customer_id: container.customer_id().into_inner(),
        description: container.description().to_owned(),
        kind: container.kind().map(str::to_owned),
        declared_capacity_kg: container.declared_capacity_kg(),
        weight_kg: container.weight_kg(),
        volume_m3: container.volume_m3(),
        state: container.state().as_str().to_owned(),
        current_deposit_id: container.current_deposit().map(DepositId::into_inner),
        created_at: container.created_at(),
        updated_at: container.updated_at(),
    }
}

/// Converts a database row to a domain container.
fn row_to_container(row: ContainerRow) -> ShipmentRepositoryResult<Container> {
    let state = ContainerState::try_from(row.state.as_str())
        .map_err(ShipmentRepositoryError::persistence)?;
    let data = PersistedContainerData {
        id: ContainerId::from_uuid(row.id),
        customer_id: CustomerId::from_uuid(row.customer_id),
        description: row.description,
        kind: row.kind,
        declared_capacity_kg: row.declared_capacity_kg,
        weight_kg: row.weight_kg,
        volume_m3: row.volume_m3,
        state,
        current_deposit: row.current_deposit_id.map(DepositId::from_uuid),
        created_at: row.created_at,
        updated_at: row.updated_at,
    };
    Container::from_persisted(data).map_err(ShipmentRepositoryError::persistence)
}

/// Converts a domain request to its row representation.
fn request_to_row(request: &ShippingRequest) -> RequestRow {
    RequestRow {
        id: request.id().into_inner(),
        container_id: request.container_id().into_inner(),
        customer_id: request.customer_id().into_inner(),
        state: request.state().as_str().to_owned(),
        estimated_cost: request.totals().map(|totals| totals.estimated_cost),
        real_cost: request.totals().map(|totals| totals.real_cost),
        estimated_hours: request.totals().map(|totals| totals.estimated_hours),
        real_hours: request.totals().map(|totals| totals.real_hours),
        created_at: request.created_at(),
        updated_at: request.updated_at(),
    }
}

/// Converts a database row to a domain request.
fn row_to_request(row: RequestRow) -> ShipmentRepositoryResult<ShippingRequest> {
    let state = RequestState::try_from(row.state.as_str())
        .map_err(ShipmentRepositoryError::persistence)?;
    let totals = match (
        row.estimated_cost,
        row.real_cost,
        row.estimated_hours,
        row.real_hours,
    ) {
        (Some(estimated_cost), Some(real_cost), Some(estimated_hours), Some(real_hours)) => {
            Some(ShipmentTotals {
                estimated_cost,
                real_cost,
                estimated_hours,
                real_hours,
            })
        }
        _ => None,
    };
    Ok(ShippingRequest::from_persisted(PersistedRequestData {
        id: RequestId::from_uuid(row.id),
        container_id: ContainerId::from_uuid(row.container_id),
        customer_id: CustomerId::from_uuid(row.customer_id),
        state,
        totals,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }))
}

/// Converts a domain route to its row representation.
fn route_to_row(route: &Route) -> RouteRow {
    RouteRow {
        id: route.id().into_inner(),
        request_id: route.request_id().into_inner(),
        name: route.name().to_owned(),
        description: route.description().map(str::to_owned),
        state: route.state().as_str().to_owned(),
        selected: route.is_selected(),
        total_distance_km: route.total_distance_km(),
        estimated_hours: route.estimated_hours(),
        estimated_cost: route.estimated_cost(),
        real_cost: route.real_cost(),
        created_at: route.created_at(),
        updated_at: route.updated_at(),
    }
}

/// Converts a database row to a domain route.
fn row_to_route(row: RouteRow) -> ShipmentRepositoryResult<Route> {
    let state =
        RouteState::try_from(row.state.as_str()).map_err(ShipmentRepositoryError::persistence)?;
    Ok(Route::from_persisted(PersistedRouteData {
        id: RouteId::from_uuid(row.id),
        request_id: RequestId::from_uuid(row.request_id),
        name: row.name,
        description: row.description,
        state,
        selected: row.selected,
        total_distance_km: row.total_distance_km,
        estimated_hours: row.estimated_hours,
        estimated_cost: row.estimated_cost,
        real_cost: row.real_cost,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }))
}

/// Converts a domain leg to its row representation.
fn leg_to_row(leg: &Leg) -> ShipmentRepositoryResult<LegRow> {
    let leg_order =
        i32::try_from(leg.order().value()).map_err(ShipmentRepositoryError::persistence)?;
    Ok(LegRow {
        id: leg.id().into_inner(),
        route_id: leg.route_id().into_inner(),
        leg_order,
        origin_deposit_id: leg.origin().deposit_id().map(DepositId::into_inner),
        origin_address: leg.origin().address().map(str::to_owned),
        destination_deposit_id: leg.destination().deposit_id().map(DepositId::into_inner),
        destination_address: leg.destination().address().map(str::to_owned),
        truck_plate: leg.truck().map(|truck| truck.as_str().to_owned()),
        state: leg.state().as_str().to_owned(),
        planned_start: leg.planned_start(),
        planned_end: leg.planned_end(),
        estimated_distance_km: leg.estimated_distance_km(),
        estimated_cost: leg.estimated_cost(),
        actual_start: leg.actual_start(),
        actual_end: leg.actual_end(),
        odometer_start: leg.odometer_start(),
        odometer_end: leg.odometer_end(),
        actual_distance_km: leg.actual_distance_km(),
        actual_cost: leg.actual_cost(),
        actual_hours: leg.actual_hours(),
        dwell_hours: leg.dwell_hours(),
        dwell_cost: leg.dwell_cost(),
        created_at: leg.created_at(),
        updated_at: leg.updated_at(),
    })
}

/// Converts a database row to a domain leg.
fn row_to_leg(row: LegRow) -> ShipmentRepositoryResult<Leg> {
    let state =
        LegState::try_from(row.state.as_str()).map_err(ShipmentRepositoryError::persistence)?;
    let order_value =
        u32::try_from(row.leg_order).map_err(ShipmentRepositoryError::persistence)?;
    let order = LegOrder::new(order_value).map_err(ShipmentRepositoryError::persistence)?;
    let origin = LegStop::from_forms(
        StopKind::Origin,
        row.origin_deposit_id.map(DepositId::from_uuid),
        row.origin_address,
    )
    .map_err(ShipmentRepositoryError::persistence)?;
    let destination = LegStop::from_forms(
        StopKind::Destination,
        row.destination_deposit_id.map(DepositId::from_uuid),
        row.destination_address,
    )
    .map_err(ShipmentRepositoryError::persistence)?;
    let truck = row
        .truck_plate
        .map(TruckId::new)
        .transpose()
        .map_err(ShipmentRepositoryError::persistence)?;

    Ok(Leg::from_persisted(PersistedLegData {
        id: LegId::from_uuid(row.id),
        route_id: RouteId::from_uuid(row.route_id),
        order,
        origin,
        destination,
        truck,
        state,
        planned_start: row.planned_start,
        planned_end: row.planned_end,
        estimated_distance_km: row.estimated_distance_km,
        estimated_cost: row.estimated_cost,
        actual_start: row.actual_start,
        actual_end: row.actual_end,
        odometer_start: row.odometer_start,
        odometer_end: row.odometer_end,
        actual_distance_km: row.actual_distance_km,
        actual_cost: row.actual_cost,
        actual_hours: row.actual_hours,
        dwell_hours: row.dwell_hours,
        dwell_cost: row.dwell_cost,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }))
}
