//! Diesel row models for shipment persistence.

use super::schema::{containers, legs, routes, shipping_requests};
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query result row for container records.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = containers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct ContainerRow {
    /// Container identifier.
    pub id: uuid::Uuid,
    /// Owning customer.
    pub customer_id: uuid::Uuid,
    /// Descriptive text.
    pub description: String,
    /// Container kind, when recorded.
    pub kind: Option<String>,
    /// Declared weight capacity.
    pub declared_capacity_kg: Option<f64>,
    /// Measured weight.
    pub weight_kg: Option<f64>,
    /// Measured volume.
    pub volume_m3: Option<f64>,
    /// Lifecycle state.
    pub state: String,
    /// Deposit the container is parked at, only while in deposit.
    pub current_deposit_id: Option<uuid::Uuid>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Query result row for shipping request records.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = shipping_requests)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct RequestRow {
    /// Request identifier.
    pub id: uuid::Uuid,
    /// Referenced container.
    pub container_id: uuid::Uuid,
    /// Owning customer.
    pub customer_id: uuid::Uuid,
    /// Lifecycle state.
    pub state: String,
    /// Consolidated estimated cost.
    pub estimated_cost: Option<f64>,
    /// Consolidated real cost.
    pub real_cost: Option<f64>,
    /// Consolidated estimated hours.
    pub estimated_hours: Option<f64>,
    /// Consolidated real hours.
    pub real_hours: Option<f64>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Query result row for route records.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = routes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct RouteRow {
    /// Route identifier.
    pub id: uuid::Uuid,
    /// Owning request.
    pub request_id: uuid::Uuid,
    /// Display name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Lifecycle state.
    pub state: String,
    /// Selection flag.
    pub selected: bool,
    /// Aggregate estimated distance.
    pub total_distance_km: f64,
    /// Aggregate estimated duration in hours.
    pub estimated_hours: f64,
    /// Aggregate estimated cost.
    pub estimated_cost: f64,
    /// Aggregate real cost, once completed.
    pub real_cost: Option<f64>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Query result row for leg records.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = legs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct LegRow {
    /// Leg identifier.
    pub id: uuid::Uuid,
    /// Owning route.
    pub route_id: uuid::Uuid,
    /// One-based position within the route.
    pub leg_order: i32,
    /// Origin deposit reference.
    pub origin_deposit_id: Option<uuid::Uuid>,
    /// Origin free-form address.
    pub origin_address: Option<String>,
    /// Destination deposit reference.
    pub destination_deposit_id: Option<uuid::Uuid>,
    /// Destination free-form address.
    pub destination_address: Option<String>,
    /// Bound truck plate.
    pub truck_plate: Option<String>,
    /// Lifecycle state.
    pub state: String,
    /// Planned departure time.
    pub planned_start: Option<DateTime<Utc>>,
    /// Planned arrival time.
    pub planned_end: Option<DateTime<Utc>>,
    /// Estimated distance.
    pub estimated_distance_km: f64,
    /// Estimated transport cost.
    pub estimated_cost: f64,
    /// Real departure time.
    pub actual_start: Option<DateTime<Utc>>,
    /// Real arrival time.
    pub actual_end: Option<DateTime<Utc>>,
    /// Odometer reading at departure.
    pub odometer_start: Option<f64>,
    /// Odometer reading at arrival.
    pub odometer_end: Option<f64>,
    /// Real distance.
    pub actual_distance_km: Option<f64>,
    /// Real transport cost.
    pub actual_cost: Option<f64>,
    /// Real driving hours.
    pub actual_hours: Option<f64>,
    /// Dwell hours before this leg began.
    pub dwell_hours: Option<f64>,
    /// Dwell cost before this leg began.
    pub dwell_cost: Option<f64>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}
