//! Tests for request creation guards, route selection/pruning, and leg
//! drafting.

use rstest::{fixture, rstest};

use super::support::Harness;
use crate::shipment::domain::{
    ContainerState, CustomerId, LegOrder, RequestState, RouteState, ShipmentDomainError,
};
use crate::shipment::ports::{ShipmentRepository, ShipmentRepositoryError};
use crate::shipment::services::{CreateLegInput, EstimationError, PlanningError};

#[fixture]
fn harness() -> Harness {
    Harness::new()
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn create_request_requires_a_registered_customer(harness: Harness) {
    let registered = harness.seed_customer();
    let container = harness.seed_container(registered, 1_000.0, 5.0).await;

    let ghost = CustomerId::new();
    let result = harness.planning.create_request(container.id(), ghost).await;
    assert!(matches!(
        result,
        Err(PlanningError::CustomerNotFound(id)) if id == ghost
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn create_request_starts_in_draft(harness: Harness) {
    let customer_id = harness.seed_customer();
    let container = harness.seed_container(customer_id, 1_000.0, 5.0).await;

    let request = harness
        .planning
        .create_request(container.id(), customer_id)
        .await
        .expect("available container must be accepted");

    assert_eq!(request.state(), RequestState::Draft);
    assert!(request.totals().is_none());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn create_request_rejects_containers_mid_shipment(harness: Harness) {
    let deposit_id = harness.seed_deposit(Some(10.0), None);
    harness.seed_truck("AA111AA", 20_000.0, 40.0, 2.0);

    let (_, route, first, _) = harness.draft_two_leg_shipment(deposit_id).await;
    harness.planning.select_route(route.id()).await.expect("selection");
    let truck = harness.seed_truck("BB222BB", 20_000.0, 40.0, 2.0);
    harness
        .execution
        .assign_truck(first.id(), truck)
        .await
        .expect("assignment");
    harness
        .execution
        .start_leg(first.id(), None)
        .await
        .expect("start");
    harness
        .execution
        .finish_leg(first.id(), None, None)
        .await
        .expect("finish");

    // The container is now parked at the deposit, waiting for leg two.
    let request = harness
        .repository
        .find_request(route.request_id())
        .await
        .expect("lookup")
        .expect("request exists");
    let container_id = request.container_id();
    let customer_id = request.customer_id();

    let result = harness
        .planning
        .create_request(container_id, customer_id)
        .await;
    assert!(matches!(
        result,
        Err(PlanningError::ContainerUnavailable {
            state: ContainerState::InDeposit,
            ..
        })
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn select_route_prunes_every_alternative(harness: Harness) {
    harness.seed_truck("AA111AA", 20_000.0, 40.0, 2.0);
    let (request, chosen) = harness.draft_shipment(15_000.0, 30.0).await;
    let alt_one = harness
        .planning
        .create_route(request.id(), "coastal detour", None)
        .await
        .expect("alternative route");
    let alt_two = harness
        .planning
        .create_route(request.id(), "mountain pass", Some("toll-free".to_owned()))
        .await
        .expect("alternative route");
    harness
        .planning
        .create_leg(
            alt_one.id(),
            CreateLegInput::new()
                .with_origin_address("Rosario")
                .with_destination_address("Cordoba"),
        )
        .await
        .expect("alternative leg");

    let selected = harness
        .planning
        .select_route(chosen.id())
        .await
        .expect("selection succeeds");

    assert!(selected.is_selected());
    assert_eq!(selected.state(), RouteState::Pending);

    let remaining = harness
        .repository
        .routes_by_request(request.id())
        .await
        .expect("route listing");
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining.first().map(crate::shipment::domain::Route::id), Some(chosen.id()));

    // Pruned routes lose their legs too.
    for pruned in [alt_one.id(), alt_two.id()] {
        let legs = harness
            .repository
            .legs_by_route(pruned)
            .await
            .expect("leg listing");
        assert!(legs.is_empty());
    }

    let request_after = harness
        .repository
        .find_request(request.id())
        .await
        .expect("lookup")
        .expect("request exists");
    assert_eq!(request_after.state(), RequestState::Scheduled);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn reselection_while_scheduled_swaps_the_choice(harness: Harness) {
    let (request, first_route) = harness.draft_shipment(15_000.0, 30.0).await;
    harness
        .planning
        .select_route(first_route.id())
        .await
        .expect("first selection");

    let replacement = harness
        .planning
        .create_route(request.id(), "revised corridor", None)
        .await
        .expect("replacement route");
    let selected = harness
        .planning
        .select_route(replacement.id())
        .await
        .expect("reselection while scheduled is allowed");

    assert!(selected.is_selected());
    let remaining = harness
        .repository
        .routes_by_request(request.id())
        .await
        .expect("route listing");
    assert_eq!(remaining.len(), 1);
    assert_eq!(
        remaining.first().map(crate::shipment::domain::Route::id),
        Some(replacement.id())
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn select_route_is_locked_once_in_transit(harness: Harness) {
    let truck = harness.seed_truck("AA111AA", 20_000.0, 40.0, 2.0);
    let (request, route) = harness.draft_shipment(15_000.0, 30.0).await;
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
    harness.planning.select_route(route.id()).await.expect("selection");
    harness
        .execution
        .assign_truck(leg.id(), truck)
        .await
        .expect("assignment");
    harness.execution.start_leg(leg.id(), None).await.expect("start");

    let late_alternative = harness
        .planning
        .create_route(request.id(), "too late", None)
        .await
        .expect("route creation itself is not locked");
    let result = harness.planning.select_route(late_alternative.id()).await;

    assert!(matches!(
        result,
        Err(PlanningError::RequestLocked {
            state: RequestState::InTransit,
            ..
        })
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn delete_route_guards_selected_routes_with_active_legs(harness: Harness) {
    let truck = harness.seed_truck("AA111AA", 20_000.0, 40.0, 2.0);
    let (_, route) = harness.draft_shipment(15_000.0, 30.0).await;
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
    harness.planning.select_route(route.id()).await.expect("selection");

    // Selected with only estimated legs: still deletable.
    // (Verified by deleting a clone scenario below; here we progress the leg
    // first and expect the guard.)
    harness
        .execution
        .assign_truck(leg.id(), truck)
        .await
        .expect("assignment");

    let result = harness.planning.delete_route(route.id()).await;
    assert!(matches!(
        result,
        Err(PlanningError::RouteInUse { active_legs: 1, .. })
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn delete_selected_route_with_only_estimated_legs_succeeds(harness: Harness) {
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
        .expect("leg fixture");
    harness.planning.select_route(route.id()).await.expect("selection");

    harness
        .planning
        .delete_route(route.id())
        .await
        .expect("estimated-only selected route is deletable");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn delete_request_is_locked_once_in_transit(harness: Harness) {
    let truck = harness.seed_truck("AA111AA", 20_000.0, 40.0, 2.0);
    let (request, route) = harness.draft_shipment(15_000.0, 30.0).await;
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
    harness.planning.select_route(route.id()).await.expect("selection");
    harness
        .execution
        .assign_truck(leg.id(), truck)
        .await
        .expect("assignment");
    harness.execution.start_leg(leg.id(), None).await.expect("start");

    let result = harness.planning.delete_request(request.id()).await;
    assert!(matches!(result, Err(PlanningError::RequestLocked { .. })));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn delete_draft_request_cascades_routes_and_legs(harness: Harness) {
    let (request, route) = harness.draft_shipment(15_000.0, 30.0).await;
    harness
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
        .delete_request(request.id())
        .await
        .expect("draft request is deletable");

    let routes = harness
        .repository
        .routes_by_request(request.id())
        .await
        .expect("route listing");
    assert!(routes.is_empty());
    let legs = harness
        .repository
        .legs_by_route(route.id())
        .await
        .expect("leg listing");
    assert!(legs.is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn create_leg_rejects_ambiguous_and_missing_stops(harness: Harness) {
    let deposit_id = harness.seed_deposit(Some(10.0), None);
    let (_, route) = harness.draft_shipment(15_000.0, 30.0).await;

    let ambiguous = harness
        .planning
        .create_leg(
            route.id(),
            CreateLegInput::new()
                .with_origin_deposit(deposit_id)
                .with_origin_address("Rosario")
                .with_destination_address("Cordoba"),
        )
        .await;
    assert!(matches!(
        ambiguous,
        Err(PlanningError::Domain(ShipmentDomainError::AmbiguousStop(_)))
    ));

    let missing = harness
        .planning
        .create_leg(
            route.id(),
            CreateLegInput::new().with_origin_address("Rosario"),
        )
        .await;
    assert!(matches!(
        missing,
        Err(PlanningError::Domain(ShipmentDomainError::MissingStop(_)))
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn leg_orders_default_to_the_next_free_position(harness: Harness) {
    let (_, route) = harness.draft_shipment(15_000.0, 30.0).await;

    let first = harness
        .planning
        .create_leg(
            route.id(),
            CreateLegInput::new()
                .with_origin_address("Rosario")
                .with_destination_address("San Lorenzo"),
        )
        .await
        .expect("first leg");
    let second = harness
        .planning
        .create_leg(
            route.id(),
            CreateLegInput::new()
                .with_origin_address("San Lorenzo")
                .with_destination_address("Cordoba"),
        )
        .await
        .expect("second leg");

    assert_eq!(first.order(), LegOrder::FIRST);
    assert_eq!(second.order().value(), 2);

    let duplicate = harness
        .planning
        .create_leg(
            route.id(),
            CreateLegInput::new()
                .with_origin_address("Cordoba")
                .with_destination_address("Villa Maria")
                .with_order(2),
        )
        .await;
    assert!(matches!(
        duplicate,
        Err(PlanningError::Repository(
            ShipmentRepositoryError::DuplicateLegOrder { .. }
        ))
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn create_leg_fails_hard_when_no_truck_can_carry_the_cargo(harness: Harness) {
    harness.seed_truck("AA111AA", 5_000.0, 10.0, 2.0);
    let (_, route) = harness.draft_shipment(15_000.0, 30.0).await;

    let result = harness
        .planning
        .create_leg(
            route.id(),
            CreateLegInput::new()
                .with_origin_address("Rosario")
                .with_destination_address("Cordoba"),
        )
        .await;

    assert!(matches!(
        result,
        Err(PlanningError::Estimation(
            EstimationError::NoEligibleCarrier { .. }
        ))
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn route_aggregates_accumulate_created_legs(harness: Harness) {
    harness.seed_truck("AA111AA", 20_000.0, 40.0, 2.0);
    harness.seed_truck("BB222BB", 20_000.0, 40.0, 4.0);
    let (_, route) = harness.draft_shipment(15_000.0, 30.0).await;

    harness
        .planning
        .create_leg(
            route.id(),
            CreateLegInput::new()
                .with_origin_address("Rosario")
                .with_destination_address("San Lorenzo"),
        )
        .await
        .expect("first leg");
    harness
        .planning
        .create_leg(
            route.id(),
            CreateLegInput::new()
                .with_origin_address("San Lorenzo")
                .with_destination_address("Cordoba"),
        )
        .await
        .expect("second leg");

    let stored = harness
        .repository
        .find_route(route.id())
        .await
        .expect("lookup")
        .expect("route exists");
    // Two legs at 100 km / 2 h / 300 each (mean tariff 3.0).
    assert_eq!(stored.total_distance_km(), 200.0);
    assert_eq!(stored.estimated_hours(), 4.0);
    assert_eq!(stored.estimated_cost(), 600.0);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn cancel_request_is_only_reachable_before_transit(harness: Harness) {
    let (request, _) = harness.draft_shipment(15_000.0, 30.0).await;

    let cancelled = harness
        .planning
        .cancel_request(request.id())
        .await
        .expect("draft request is cancellable");
    assert_eq!(cancelled.state(), RequestState::Cancelled);

    let again = harness.planning.cancel_request(request.id()).await;
    assert!(matches!(again, Err(PlanningError::Domain(_))));
}
