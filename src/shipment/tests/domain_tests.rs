//! Unit tests for domain state machines and validated value objects.

use crate::shipment::domain::{
    Container, ContainerEvent, ContainerId, ContainerState, CustomerId, DepositId, LegOrder,
    LegState, LegStop, PersistedContainerData, RequestState, RouteState, ShipmentDomainError,
    ShipmentTotals, StopKind, TruckId,
};
use eyre::{bail, ensure};
use mockable::{Clock, DefaultClock};
use rstest::{fixture, rstest};

#[fixture]
fn clock() -> DefaultClock {
    DefaultClock
}

#[rstest]
#[case(LegState::Estimated, LegState::Estimated, false)]
#[case(LegState::Estimated, LegState::Assigned, true)]
#[case(LegState::Estimated, LegState::Started, false)]
#[case(LegState::Estimated, LegState::Finished, false)]
#[case(LegState::Assigned, LegState::Estimated, false)]
#[case(LegState::Assigned, LegState::Assigned, false)]
#[case(LegState::Assigned, LegState::Started, true)]
#[case(LegState::Assigned, LegState::Finished, false)]
#[case(LegState::Started, LegState::Estimated, false)]
#[case(LegState::Started, LegState::Assigned, false)]
#[case(LegState::Started, LegState::Started, false)]
#[case(LegState::Started, LegState::Finished, true)]
#[case(LegState::Finished, LegState::Estimated, false)]
#[case(LegState::Finished, LegState::Assigned, false)]
#[case(LegState::Finished, LegState::Started, false)]
#[case(LegState::Finished, LegState::Finished, false)]
fn leg_can_transition_to_returns_expected(
    #[case] from: LegState,
    #[case] to: LegState,
    #[case] expected: bool,
) {
    assert_eq!(from.can_transition_to(to), expected);
}

#[rstest]
#[case(RouteState::Pending, RouteState::Running, true)]
#[case(RouteState::Pending, RouteState::Cancelled, true)]
#[case(RouteState::Pending, RouteState::Discarded, true)]
#[case(RouteState::Pending, RouteState::Completed, false)]
#[case(RouteState::Running, RouteState::Completed, true)]
#[case(RouteState::Running, RouteState::Pending, false)]
#[case(RouteState::Running, RouteState::Cancelled, false)]
#[case(RouteState::Completed, RouteState::Running, false)]
#[case(RouteState::Cancelled, RouteState::Pending, false)]
#[case(RouteState::Discarded, RouteState::Running, false)]
fn route_can_transition_to_returns_expected(
    #[case] from: RouteState,
    #[case] to: RouteState,
    #[case] expected: bool,
) {
    assert_eq!(from.can_transition_to(to), expected);
}

#[rstest]
#[case(RequestState::Draft, RequestState::Scheduled, true)]
#[case(RequestState::Draft, RequestState::Cancelled, true)]
#[case(RequestState::Draft, RequestState::InTransit, false)]
#[case(RequestState::Draft, RequestState::Delivered, false)]
#[case(RequestState::Scheduled, RequestState::InTransit, true)]
#[case(RequestState::Scheduled, RequestState::Cancelled, true)]
#[case(RequestState::Scheduled, RequestState::Delivered, false)]
#[case(RequestState::InTransit, RequestState::Delivered, true)]
#[case(RequestState::InTransit, RequestState::Cancelled, false)]
#[case(RequestState::InTransit, RequestState::Scheduled, false)]
#[case(RequestState::Delivered, RequestState::Draft, false)]
#[case(RequestState::Cancelled, RequestState::Scheduled, false)]
fn request_can_transition_to_returns_expected(
    #[case] from: RequestState,
    #[case] to: RequestState,
    #[case] expected: bool,
) {
    assert_eq!(from.can_transition_to(to), expected);
}

#[rstest]
#[case(ContainerState::Origin, true)]
#[case(ContainerState::Available, true)]
#[case(ContainerState::Delivered, true)]
#[case(ContainerState::InTransit, false)]
#[case(ContainerState::InDeposit, false)]
fn container_admits_new_request_returns_expected(
    #[case] state: ContainerState,
    #[case] expected: bool,
) {
    assert_eq!(state.admits_new_request(), expected);
}

#[rstest]
fn leg_state_parses_legacy_pending_as_estimated() -> eyre::Result<()> {
    ensure!(LegState::try_from("pending")? == LegState::Estimated);
    ensure!(LegState::try_from(" ESTIMATED ")? == LegState::Estimated);
    ensure!(LegState::try_from("bogus").is_err());
    Ok(())
}

#[rstest]
fn stop_requires_exactly_one_form() -> eyre::Result<()> {
    let both = LegStop::from_forms(
        StopKind::Origin,
        Some(DepositId::new()),
        Some("Ruta 9 km 42".to_owned()),
    );
    ensure!(both == Err(ShipmentDomainError::AmbiguousStop(StopKind::Origin)));

    let neither = LegStop::from_forms(StopKind::Destination, None, None);
    ensure!(neither == Err(ShipmentDomainError::MissingStop(StopKind::Destination)));

    let blank = LegStop::from_forms(StopKind::Destination, None, Some("   ".to_owned()));
    ensure!(blank == Err(ShipmentDomainError::MissingStop(StopKind::Destination)));

    let deposit_id = DepositId::new();
    let deposit = LegStop::from_forms(StopKind::Origin, Some(deposit_id), None)?;
    ensure!(deposit.deposit_id() == Some(deposit_id));
    ensure!(deposit.address().is_none());

    let address = LegStop::from_forms(StopKind::Origin, None, Some("Bv. Oroño 1500".to_owned()))?;
    ensure!(address.address() == Some("Bv. Oroño 1500"));
    Ok(())
}

#[rstest]
fn truck_plate_is_normalized_and_validated() -> eyre::Result<()> {
    let plate = TruckId::new("  ab123cd ")?;
    ensure!(plate.as_str() == "AB123CD");

    ensure!(matches!(
        TruckId::new("   "),
        Err(ShipmentDomainError::InvalidTruckPlate(_))
    ));
    ensure!(matches!(
        TruckId::new("AB 123"),
        Err(ShipmentDomainError::InvalidTruckPlate(_))
    ));
    Ok(())
}

#[rstest]
fn leg_order_is_one_based_and_dense() -> eyre::Result<()> {
    ensure!(matches!(
        LegOrder::new(0),
        Err(ShipmentDomainError::InvalidLegOrder(0))
    ));
    let third = LegOrder::new(3)?;
    ensure!(third.predecessor() == Some(LegOrder::new(2)?));
    ensure!(LegOrder::FIRST.predecessor().is_none());
    ensure!(LegOrder::FIRST.next() == LegOrder::new(2)?);
    Ok(())
}

#[rstest]
fn container_apply_keeps_deposit_invariant(clock: DefaultClock) -> eyre::Result<()> {
    let mut container = Container::new(CustomerId::new(), "dry van", &clock);
    ensure!(container.state() == ContainerState::Available);
    ensure!(container.current_deposit().is_none());

    container.apply(ContainerEvent::LegStarted, &clock);
    ensure!(container.state() == ContainerState::InTransit);
    ensure!(container.current_deposit().is_none());

    let deposit_id = DepositId::new();
    container.apply(ContainerEvent::ArrivedAtDeposit(deposit_id), &clock);
    ensure!(container.state() == ContainerState::InDeposit);
    ensure!(container.current_deposit() == Some(deposit_id));

    container.apply(ContainerEvent::LegStarted, &clock);
    ensure!(container.current_deposit().is_none());

    container.apply(ContainerEvent::DeliveryCompleted, &clock);
    ensure!(container.state() == ContainerState::Delivered);
    ensure!(container.current_deposit().is_none());
    Ok(())
}

#[rstest]
fn persisted_container_rejects_invariant_violations(clock: DefaultClock) -> eyre::Result<()> {
    let template = Container::new(CustomerId::new(), "flat rack", &clock);
    let base = PersistedContainerData {
        id: ContainerId::new(),
        customer_id: template.customer_id(),
        description: "flat rack".to_owned(),
        kind: None,
        declared_capacity_kg: None,
        weight_kg: None,
        volume_m3: None,
        state: ContainerState::InDeposit,
        current_deposit: None,
        created_at: template.created_at(),
        updated_at: template.updated_at(),
    };

    let missing_ref = Container::from_persisted(base.clone());
    if !matches!(missing_ref, Err(ShipmentDomainError::DepositRefRequired(_))) {
        bail!("expected DepositRefRequired, got {missing_ref:?}");
    }

    let stale_ref = Container::from_persisted(PersistedContainerData {
        state: ContainerState::Available,
        current_deposit: Some(DepositId::new()),
        ..base.clone()
    });
    if !matches!(
        stale_ref,
        Err(ShipmentDomainError::UnexpectedDepositRef { .. })
    ) {
        bail!("expected UnexpectedDepositRef, got {stale_ref:?}");
    }

    let valid = Container::from_persisted(PersistedContainerData {
        current_deposit: Some(DepositId::new()),
        ..base
    })?;
    ensure!(valid.state() == ContainerState::InDeposit);
    Ok(())
}

#[rstest]
fn container_real_metrics_require_both_positive_figures(clock: DefaultClock) {
    let incomplete = Container::new(CustomerId::new(), "tank", &clock).with_real_metrics(0.0, 12.0);
    assert!(incomplete.real_metrics().is_none());

    let complete =
        Container::new(CustomerId::new(), "tank", &clock).with_real_metrics(8_000.0, 12.0);
    let metrics = complete.real_metrics();
    assert!(metrics.is_some_and(|m| m.weight_kg == 8_000.0 && m.volume_m3 == 12.0));
}

#[rstest]
fn estimation_metrics_fall_back_to_declared_capacity(clock: DefaultClock) {
    let container = Container::new(CustomerId::new(), "dry van", &clock)
        .with_declared_capacity(10_000.0);
    let metrics = container.estimation_metrics();
    assert_eq!(metrics.weight_kg, 10_000.0);
    assert_eq!(metrics.volume_m3, 0.0);
}

#[rstest]
fn totals_variance_is_derived_not_stored() {
    let totals = ShipmentTotals {
        estimated_cost: 600.0,
        real_cost: 470.0,
        estimated_hours: 4.0,
        real_hours: 10.0,
    };
    assert_eq!(totals.cost_variance(), -130.0);
    let pct = totals.cost_variance_pct();
    assert!(pct.is_some_and(|value| (value - (-130.0 / 600.0 * 100.0)).abs() < 1e-9));
    assert_eq!(totals.time_variance_hours(), 6.0);

    let unestimated = ShipmentTotals {
        estimated_cost: 0.0,
        real_cost: 50.0,
        estimated_hours: 0.0,
        real_hours: 1.0,
    };
    assert!(unestimated.cost_variance_pct().is_none());
}

#[rstest]
fn leg_mutators_enforce_the_state_sequence(clock: DefaultClock) -> eyre::Result<()> {
    use crate::shipment::domain::{Leg, RouteId};

    let origin = LegStop::from_forms(StopKind::Origin, None, Some("origin st 1".to_owned()))?;
    let destination =
        LegStop::from_forms(StopKind::Destination, None, Some("dest av 2".to_owned()))?;
    let mut leg = Leg::new(RouteId::new(), LegOrder::FIRST, origin, destination, &clock);

    // Starting or finishing an estimated leg is out of order.
    let premature_start = leg.start(None, &clock);
    if !matches!(
        premature_start,
        Err(ShipmentDomainError::InvalidLegTransition {
            from: LegState::Estimated,
            to: LegState::Started,
            allowed: "assigned",
            ..
        })
    ) {
        bail!("expected estimated->started rejection, got {premature_start:?}");
    }

    leg.assign_truck(TruckId::new("AA111AA")?, &clock)?;
    ensure!(leg.state() == LegState::Assigned);

    leg.start(Some(1_000.0), &clock)?;
    ensure!(leg.state() == LegState::Started);
    ensure!(leg.actual_start().is_some());

    let double_start = leg.start(None, &clock);
    ensure!(double_start.is_err());

    leg.finish(None, Some(1_110.0), &clock)?;
    ensure!(leg.state() == LegState::Finished);
    ensure!(leg.odometer_delta() == Some(110.0));

    let after_terminal = leg.assign_truck(TruckId::new("BB222BB")?, &clock);
    if !matches!(
        after_terminal,
        Err(ShipmentDomainError::InvalidLegTransition {
            from: LegState::Finished,
            ..
        })
    ) {
        bail!("expected terminal rejection, got {after_terminal:?}");
    }
    Ok(())
}

#[rstest]
fn negative_odometer_delta_is_unusable(clock: DefaultClock) -> eyre::Result<()> {
    use crate::shipment::domain::{Leg, RouteId};

    let origin = LegStop::from_forms(StopKind::Origin, None, Some("a".to_owned()))?;
    let destination = LegStop::from_forms(StopKind::Destination, None, Some("b".to_owned()))?;
    let mut leg = Leg::new(RouteId::new(), LegOrder::FIRST, origin, destination, &clock);
    leg.assign_truck(TruckId::new("CC333CC")?, &clock)?;
    leg.start(Some(2_000.0), &clock)?;
    leg.finish(None, Some(1_900.0), &clock)?;

    ensure!(leg.odometer_delta().is_none());
    Ok(())
}

#[rstest]
fn route_begin_is_idempotent(clock: DefaultClock) -> eyre::Result<()> {
    use crate::shipment::domain::{RequestId, Route};

    let mut route = Route::new(RequestId::new(), "via nine", &clock);
    ensure!(route.begin(&clock)?);
    ensure!(route.state() == RouteState::Running);
    // Re-entering while running is a no-op, not an error.
    ensure!(!route.begin(&clock)?);

    route.complete(470.0, &clock)?;
    ensure!(route.state() == RouteState::Completed);
    ensure!(route.real_cost() == Some(470.0));
    ensure!(route.begin(&clock).is_err());
    Ok(())
}

#[rstest]
fn request_records_totals_only_through_delivery(clock: DefaultClock) -> eyre::Result<()> {
    use crate::shipment::domain::{ContainerId, ShippingRequest};

    let mut request = ShippingRequest::new(ContainerId::new(), CustomerId::new(), &clock);
    let totals = ShipmentTotals {
        estimated_cost: 600.0,
        real_cost: 470.0,
        estimated_hours: 4.0,
        real_hours: 10.0,
    };

    // Delivery cannot be recorded while still in draft.
    let premature = request.record_totals(totals, &clock);
    ensure!(premature.is_err());

    request.transition_to(RequestState::Scheduled, &clock)?;
    request.transition_to(RequestState::InTransit, &clock)?;
    request.record_totals(totals, &clock)?;
    ensure!(request.state() == RequestState::Delivered);
    ensure!(request.totals() == Some(&totals));

    // Re-consolidation refreshes the figures rather than failing.
    let refreshed = ShipmentTotals {
        real_cost: 480.0,
        ..totals
    };
    request.record_totals(refreshed, &clock)?;
    ensure!(request.totals() == Some(&refreshed));
    Ok(())
}

#[rstest]
fn stops_and_states_round_trip_through_serde() -> eyre::Result<()> {
    let deposit_id = DepositId::new();
    let stop = LegStop::from_forms(StopKind::Origin, Some(deposit_id), None)?;
    let json = serde_json::to_string(&stop)?;
    ensure!(json.contains("\"type\":\"deposit\""));
    let back: LegStop = serde_json::from_str(&json)?;
    ensure!(back == stop);

    ensure!(serde_json::to_string(&LegState::Estimated)? == "\"estimated\"");
    ensure!(serde_json::to_string(&RequestState::InTransit)? == "\"in_transit\"");
    ensure!(serde_json::to_string(&ContainerState::InDeposit)? == "\"in_deposit\"");
    Ok(())
}

#[rstest]
fn clock_stamps_move_forward(clock: DefaultClock) {
    let before = clock.utc();
    let container = Container::new(CustomerId::new(), "open top", &clock);
    assert!(container.created_at() >= before);
    assert_eq!(container.created_at(), container.updated_at());
}
