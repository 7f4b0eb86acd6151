//! Diesel schema for shipment lifecycle persistence.

diesel::table! {
    /// Registered customers, referenced by requests and containers.
    customers (id) {
        /// Customer identifier.
        id -> Uuid,
        /// Display name.
        #[max_length = 255]
        name -> Varchar,
    }
}

diesel::table! {
    /// Container records with measured cargo figures and derived state.
    containers (id) {
        /// Container identifier.
        id -> Uuid,
        /// Owning customer.
        customer_id -> Uuid,
        /// Descriptive text.
        description -> Text,
        /// Container kind, when recorded.
        #[max_length = 100]
        kind -> Nullable<Varchar>,
        /// Declared weight capacity in kilograms.
        declared_capacity_kg -> Nullable<Float8>,
        /// Measured weight in kilograms.
        weight_kg -> Nullable<Float8>,
        /// Measured volume in cubic metres.
        volume_m3 -> Nullable<Float8>,
        /// Lifecycle state.
        #[max_length = 50]
        state -> Varchar,
        /// Deposit the container is parked at, only while in deposit.
        current_deposit_id -> Nullable<Uuid>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Shipping requests with consolidated totals once delivered.
    shipping_requests (id) {
        /// Request identifier.
        id -> Uuid,
        /// Referenced container.
        container_id -> Uuid,
        /// Owning customer.
        customer_id -> Uuid,
        /// Lifecycle state.
        #[max_length = 50]
        state -> Varchar,
        /// Consolidated estimated cost.
        estimated_cost -> Nullable<Float8>,
        /// Consolidated real cost.
        real_cost -> Nullable<Float8>,
        /// Consolidated estimated hours.
        estimated_hours -> Nullable<Float8>,
        /// Consolidated real hours.
        real_hours -> Nullable<Float8>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Candidate routes; at most one selected row per request.
    routes (id) {
        /// Route identifier.
        id -> Uuid,
        /// Owning request.
        request_id -> Uuid,
        /// Display name.
        #[max_length = 255]
        name -> Varchar,
        /// Optional description.
        description -> Nullable<Text>,
        /// Lifecycle state.
        #[max_length = 50]
        state -> Varchar,
        /// Whether this is the request's selected route.
        selected -> Bool,
        /// Aggregate estimated distance in kilometres.
        total_distance_km -> Float8,
        /// Aggregate estimated duration in hours.
        estimated_hours -> Float8,
        /// Aggregate estimated cost.
        estimated_cost -> Float8,
        /// Aggregate real cost, once completed.
        real_cost -> Nullable<Float8>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Legs with estimates, actuals, and dwell figures.
    ///
    /// Unique indexes back the business rules: `idx_legs_route_order_unique`
    /// on (`route_id`, `leg_order`) keeps orders dense and unique, and the
    /// partial index `idx_legs_active_truck_unique` on `truck_plate` where
    /// state is assigned or started closes the truck double-booking race.
    legs (id) {
        /// Leg identifier.
        id -> Uuid,
        /// Owning route.
        route_id -> Uuid,
        /// One-based position within the route.
        leg_order -> Int4,
        /// Origin deposit, when the origin is a registered deposit.
        origin_deposit_id -> Nullable<Uuid>,
        /// Origin address, when the origin is free-form.
        origin_address -> Nullable<Text>,
        /// Destination deposit, when the destination is a registered
        /// deposit.
        destination_deposit_id -> Nullable<Uuid>,
        /// Destination address, when the destination is free-form.
        destination_address -> Nullable<Text>,
        /// Bound truck plate, once assigned.
        #[max_length = 20]
        truck_plate -> Nullable<Varchar>,
        /// Lifecycle state.
        #[max_length = 50]
        state -> Varchar,
        /// Planned departure time.
        planned_start -> Nullable<Timestamptz>,
        /// Planned arrival time.
        planned_end -> Nullable<Timestamptz>,
        /// Estimated distance in kilometres.
        estimated_distance_km -> Float8,
        /// Estimated transport cost.
        estimated_cost -> Float8,
        /// Real departure time.
        actual_start -> Nullable<Timestamptz>,
        /// Real arrival time.
        actual_end -> Nullable<Timestamptz>,
        /// Odometer reading at departure.
        odometer_start -> Nullable<Float8>,
        /// Odometer reading at arrival.
        odometer_end -> Nullable<Float8>,
        /// Real distance in kilometres.
        actual_distance_km -> Nullable<Float8>,
        /// Real transport cost.
        actual_cost -> Nullable<Float8>,
        /// Real driving time in hours.
        actual_hours -> Nullable<Float8>,
        /// Dwell hours accrued before this leg began.
        dwell_hours -> Nullable<Float8>,
        /// Dwell cost accrued before this leg began.
        dwell_cost -> Nullable<Float8>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}
