//! Tests for truck admission control: exclusivity, data completeness, and
//! capacity.

use rstest::{fixture, rstest};

use super::support::Harness;
use crate::shipment::domain::{LegState, TruckId};
use crate::shipment::ports::{FleetPort, FleetResult, Truck};
use crate::shipment::services::{AdmissionError, CreateLegInput, ExecutionError};

mockall::mock! {
    Fleet {}

    #[async_trait::async_trait]
    impl FleetPort for Fleet {
        async fn get_truck(&self, id: &TruckId) -> FleetResult<Truck>;
        async fn list_trucks(&self) -> FleetResult<Vec<Truck>>;
    }
}

#[fixture]
fn harness() -> Harness {
    Harness::new()
}

async fn single_leg(harness: &Harness) -> crate::shipment::domain::Leg {
    let (_, route) = harness.draft_shipment(15_000.0, 30.0).await;
    harness
        .planning
        .create_leg(
            route.id(),
            CreateLegInput::new()
                .with_origin_address("Rosario")
                .with_destination_address("Cordoba"),
        )
        .await
        .expect("leg fixture")
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn assignment_at_exact_capacity_succeeds(harness: Harness) {
    let truck = harness.seed_truck("AA111AA", 15_000.0, 30.0, 2.0);
    let leg = single_leg(&harness).await;

    let assigned = harness
        .execution
        .assign_truck(leg.id(), truck.clone())
        .await
        .expect("boundary capacity must be admitted");

    assert_eq!(assigned.state(), LegState::Assigned);
    assert_eq!(assigned.truck(), Some(&truck));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn assignment_below_capacity_fails_naming_the_shortfall(harness: Harness) {
    // An eligible truck must exist so estimation succeeds; the undersized
    // one is what the caller then tries to bind.
    harness.seed_truck("ZZ999ZZ", 30_000.0, 60.0, 3.0);
    let truck = harness.seed_truck("AA111AA", 14_999.0, 30.0, 2.0);
    let leg = single_leg(&harness).await;

    let result = harness.execution.assign_truck(leg.id(), truck).await;

    let Err(ExecutionError::Admission(AdmissionError::InsufficientCapacity {
        required_weight_kg,
        capacity_weight_kg,
        ..
    })) = result
    else {
        panic!("expected InsufficientCapacity, got {result:?}");
    };
    assert_eq!(required_weight_kg, 15_000.0);
    assert_eq!(capacity_weight_kg, 14_999.0);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn assignment_with_insufficient_volume_fails(harness: Harness) {
    harness.seed_truck("ZZ999ZZ", 30_000.0, 60.0, 3.0);
    let truck = harness.seed_truck("AA111AA", 20_000.0, 29.0, 2.0);
    let leg = single_leg(&harness).await;

    let result = harness.execution.assign_truck(leg.id(), truck).await;
    assert!(matches!(
        result,
        Err(ExecutionError::Admission(
            AdmissionError::InsufficientCapacity { .. }
        ))
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn truck_held_by_another_active_leg_is_refused(harness: Harness) {
    let truck = harness.seed_truck("AA111AA", 20_000.0, 40.0, 2.0);
    let first = single_leg(&harness).await;
    let second = single_leg(&harness).await;

    harness
        .execution
        .assign_truck(first.id(), truck.clone())
        .await
        .expect("first assignment succeeds");

    let result = harness.execution.assign_truck(second.id(), truck).await;
    let Err(ExecutionError::Admission(AdmissionError::TruckInUse { holder, .. })) = result else {
        panic!("expected TruckInUse, got {result:?}");
    };
    assert_eq!(holder, first.id());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn truck_is_released_once_its_leg_finishes(harness: Harness) {
    let truck = harness.seed_truck("AA111AA", 20_000.0, 40.0, 2.0);

    let (_, route) = harness.draft_shipment(15_000.0, 30.0).await;
    let first = harness
        .planning
        .create_leg(
            route.id(),
            CreateLegInput::new()
                .with_origin_address("Rosario")
                .with_destination_address("Cordoba"),
        )
        .await
        .expect("leg fixture");
    harness
        .planning
        .select_route(route.id())
        .await
        .expect("selection fixture");

    harness
        .execution
        .assign_truck(first.id(), truck.clone())
        .await
        .expect("assignment succeeds");
    harness
        .execution
        .start_leg(first.id(), None)
        .await
        .expect("start succeeds");
    harness
        .execution
        .finish_leg(first.id(), None, None)
        .await
        .expect("finish succeeds");

    // A finished leg no longer holds its truck.
    let other = single_leg(&harness).await;
    let assigned = harness
        .execution
        .assign_truck(other.id(), truck.clone())
        .await
        .expect("released truck is assignable again");
    assert_eq!(assigned.truck(), Some(&truck));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn container_without_real_metrics_is_a_client_data_error(harness: Harness) {
    let truck = harness.seed_truck("AA111AA", 20_000.0, 40.0, 2.0);

    let customer_id = harness.seed_customer();
    let container = harness.seed_bare_container(customer_id).await;
    let request = harness
        .planning
        .create_request(container.id(), customer_id)
        .await
        .expect("request fixture");
    let route = harness
        .planning
        .create_route(request.id(), "single hop", None)
        .await
        .expect("route fixture");
    let leg = harness
        .planning
        .create_leg(
            route.id(),
            CreateLegInput::new()
                .with_origin_address("Rosario")
                .with_destination_address("Cordoba"),
        )
        .await
        .expect("leg fixture");

    let result = harness.execution.assign_truck(leg.id(), truck).await;
    assert!(matches!(
        result,
        Err(ExecutionError::Admission(
            AdmissionError::MissingContainerMetrics(id)
        )) if id == container.id()
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn fleet_failure_during_capacity_check_is_not_a_silent_admission(harness: Harness) {
    use crate::shipment::domain::{
        Container, CustomerId, Leg, LegOrder, LegStop, RouteId, StopKind,
    };
    use crate::shipment::ports::FleetError;
    use crate::shipment::services::AdmissionPolicy;
    use std::sync::Arc;

    let mut fleet = MockFleet::new();
    fleet
        .expect_get_truck()
        .returning(|_| Err(FleetError::unavailable(std::io::Error::other("registry down"))));
    let policy = AdmissionPolicy::new(Arc::clone(&harness.repository))
        .with_fleet(Arc::new(fleet) as Arc<dyn FleetPort>);

    let clock = mockable::DefaultClock;
    let container =
        Container::new(CustomerId::new(), "machinery", &clock).with_real_metrics(9_000.0, 20.0);
    let origin =
        LegStop::from_forms(StopKind::Origin, None, Some("a".to_owned())).expect("valid stop");
    let destination =
        LegStop::from_forms(StopKind::Destination, None, Some("b".to_owned())).expect("valid stop");
    let leg = Leg::new(RouteId::new(), LegOrder::FIRST, origin, destination, &clock);
    let truck = TruckId::new("DD444DD").expect("valid plate");

    let result = policy.authorize(&leg, &truck, &container).await;
    assert!(matches!(
        result,
        Err(AdmissionError::Fleet(FleetError::Unavailable(_)))
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn assigning_an_already_assigned_leg_is_an_illegal_transition(harness: Harness) {
    let first_truck = harness.seed_truck("AA111AA", 20_000.0, 40.0, 2.0);
    let second_truck = harness.seed_truck("BB222BB", 20_000.0, 40.0, 3.0);
    let leg = single_leg(&harness).await;

    harness
        .execution
        .assign_truck(leg.id(), first_truck)
        .await
        .expect("first assignment succeeds");

    let result = harness.execution.assign_truck(leg.id(), second_truck).await;
    assert!(matches!(result, Err(ExecutionError::Domain(_))));
}
