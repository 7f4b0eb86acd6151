//! Shared fixtures for shipment service tests.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use mockable::Clock;

use crate::shipment::adapters::memory::{
    InMemoryDepositRegistry, InMemoryFleetRegistry, InMemoryShipmentRepository, StaticGeoService,
};
use crate::shipment::domain::{
    Container, CustomerId, DepositId, Leg, Route, ShippingRequest, TruckId,
};
use crate::shipment::ports::{
    Deposit, DepositPort, FleetPort, GeoPort, RouteMetrics, ShipmentRepository, Truck,
};
use crate::shipment::services::{
    CostEstimator, CreateLegInput, ExecutionService, PlanningService, PricingConfig,
};

/// Manually advanced clock so dwell and duration figures are deterministic.
#[derive(Debug)]
pub struct SteppingClock {
    now: RwLock<DateTime<Utc>>,
}

impl SteppingClock {
    pub fn starting_at(now: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(now),
        }
    }

    pub fn advance(&self, delta: Duration) {
        if let Ok(mut now) = self.now.write() {
            *now += delta;
        }
    }
}

impl Clock for SteppingClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.now.read().map(|now| *now).unwrap_or_default()
    }
}

pub fn test_epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0)
        .single()
        .expect("valid fixture timestamp")
}

/// In-memory wiring of both services plus every collaborator fake.
pub struct Harness {
    pub repository: Arc<InMemoryShipmentRepository>,
    pub fleet: Arc<InMemoryFleetRegistry>,
    pub deposits: Arc<InMemoryDepositRegistry>,
    pub geo: Arc<StaticGeoService>,
    pub clock: Arc<SteppingClock>,
    pub planning: PlanningService<InMemoryShipmentRepository, SteppingClock>,
    pub execution: ExecutionService<InMemoryShipmentRepository, SteppingClock>,
}

impl Harness {
    pub fn new() -> Self {
        let repository = Arc::new(InMemoryShipmentRepository::new());
        let fleet = Arc::new(InMemoryFleetRegistry::new());
        let deposits = Arc::new(InMemoryDepositRegistry::new());
        let geo = Arc::new(StaticGeoService::new());
        geo.set_fallback(RouteMetrics {
            distance_km: 100.0,
            duration_minutes: 120,
        });
        let clock = Arc::new(SteppingClock::starting_at(test_epoch()));

        let estimator = CostEstimator::new(PricingConfig::default())
            .with_geocoding(Arc::clone(&geo) as Arc<dyn GeoPort>)
            .with_fleet(Arc::clone(&fleet) as Arc<dyn FleetPort>)
            .with_deposits(Arc::clone(&deposits) as Arc<dyn DepositPort>);
        let planning =
            PlanningService::new(Arc::clone(&repository), Arc::clone(&clock), estimator);
        let execution = ExecutionService::new(
            Arc::clone(&repository),
            Arc::clone(&clock),
            PricingConfig::default(),
        )
        .with_fleet(Arc::clone(&fleet) as Arc<dyn FleetPort>)
        .with_deposits(Arc::clone(&deposits) as Arc<dyn DepositPort>);

        Self {
            repository,
            fleet,
            deposits,
            geo,
            clock,
            planning,
            execution,
        }
    }

    pub fn seed_customer(&self) -> CustomerId {
        let customer_id = CustomerId::new();
        self.repository
            .register_customer(customer_id)
            .expect("customer fixture");
        customer_id
    }

    pub async fn seed_container(
        &self,
        customer_id: CustomerId,
        weight_kg: f64,
        volume_m3: f64,
    ) -> Container {
        let container = Container::new(customer_id, "reefer, packed", &*self.clock)
            .with_real_metrics(weight_kg, volume_m3);
        self.repository
            .store_container(&container)
            .await
            .expect("container fixture");
        container
    }

    pub async fn seed_bare_container(&self, customer_id: CustomerId) -> Container {
        let container = Container::new(customer_id, "empty shell", &*self.clock);
        self.repository
            .store_container(&container)
            .await
            .expect("container fixture");
        container
    }

    pub fn seed_truck(&self, plate: &str, weight_kg: f64, volume_m3: f64, rate: f64) -> TruckId {
        let id = TruckId::new(plate).expect("valid fixture plate");
        self.fleet.upsert_truck(Truck {
            id: id.clone(),
            capacity_weight_kg: weight_kg,
            capacity_volume_m3: volume_m3,
            cost_per_km: rate,
            available: true,
        });
        id
    }

    pub fn seed_deposit(&self, hourly_rate: Option<f64>, daily_rate: Option<f64>) -> DepositId {
        let id = DepositId::new();
        self.deposits.upsert_deposit(Deposit {
            id,
            name: "central yard".to_owned(),
            address: "Av. Circunvalacion 2200".to_owned(),
            hourly_rate,
            daily_rate,
        });
        id
    }

    /// Seeds customer + container + request + one route.
    pub async fn draft_shipment(&self, weight_kg: f64, volume_m3: f64) -> (ShippingRequest, Route) {
        let customer_id = self.seed_customer();
        let container = self.seed_container(customer_id, weight_kg, volume_m3).await;
        let request = self
            .planning
            .create_request(container.id(), customer_id)
            .await
            .expect("request fixture");
        let route = self
            .planning
            .create_route(request.id(), "northern corridor", None)
            .await
            .expect("route fixture");
        (request, route)
    }

    /// Drafts a two-leg shipment: address -> deposit -> address.
    pub async fn draft_two_leg_shipment(
        &self,
        deposit_id: DepositId,
    ) -> (ShippingRequest, Route, Leg, Leg) {
        let (request, route) = self.draft_shipment(15_000.0, 30.0).await;
        let first = self
            .planning
            .create_leg(
                route.id(),
                CreateLegInput::new()
                    .with_origin_address("Rosario, Santa Fe")
                    .with_destination_deposit(deposit_id),
            )
            .await
            .expect("first leg fixture");
        let second = self
            .planning
            .create_leg(
                route.id(),
                CreateLegInput::new()
                    .with_origin_deposit(deposit_id)
                    .with_destination_address("Cordoba Capital"),
            )
            .await
            .expect("second leg fixture");
        (request, route, first, second)
    }
}
