//! Error types for shipment domain validation and parsing.

use super::container::ContainerState;
use super::ids::{ContainerId, LegId, RequestId, RouteId};
use super::leg::{LegState, StopKind};
use super::request::RequestState;
use super::route::RouteState;
use thiserror::Error;

/// Errors returned while constructing or mutating shipment domain values.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ShipmentDomainError {
    /// The requested leg state change is not a legal transition.
    #[error(
        "invalid leg transition for {leg_id}: {from} -> {to}, allowed from {from}: {allowed}"
    )]
    InvalidLegTransition {
        /// Leg whose transition was rejected.
        leg_id: LegId,
        /// State the leg is currently in.
        from: LegState,
        /// State the caller attempted to reach.
        to: LegState,
        /// Human-readable description of the legal successor.
        allowed: &'static str,
    },

    /// The requested route state change is not a legal transition.
    #[error("invalid route transition for {route_id}: {from} -> {to}")]
    InvalidRouteTransition {
        /// Route whose transition was rejected.
        route_id: RouteId,
        /// State the route is currently in.
        from: RouteState,
        /// State the caller attempted to reach.
        to: RouteState,
    },

    /// The requested request state change is not a legal transition.
    #[error("invalid request transition for {request_id}: {from} -> {to}")]
    InvalidRequestTransition {
        /// Request whose transition was rejected.
        request_id: RequestId,
        /// State the request is currently in.
        from: RequestState,
        /// State the caller attempted to reach.
        to: RequestState,
    },

    /// Neither a deposit reference nor a free-form address was supplied for
    /// a leg stop.
    #[error("{0} must carry either a deposit reference or a free-form address")]
    MissingStop(StopKind),

    /// Both a deposit reference and a free-form address were supplied for a
    /// leg stop.
    #[error("{0} may carry a deposit reference or a free-form address, not both")]
    AmbiguousStop(StopKind),

    /// A container was put in a deposit without naming the deposit.
    #[error("container {0} cannot be in deposit without a deposit reference")]
    DepositRefRequired(ContainerId),

    /// A container outside a deposit still carries a deposit reference.
    #[error("container {container_id} in state {state} must not carry a deposit reference")]
    UnexpectedDepositRef {
        /// Container holding the stale reference.
        container_id: ContainerId,
        /// State that forbids the reference.
        state: ContainerState,
    },

    /// The truck plate is empty or malformed.
    #[error("invalid truck plate: {0:?}")]
    InvalidTruckPlate(String),

    /// The leg order is not a positive integer.
    #[error("invalid leg order {0}, expected a 1-based position")]
    InvalidLegOrder(u32),
}

/// Error returned while parsing container states from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown container state: {0}")]
pub struct ParseContainerStateError(pub String);

/// Error returned while parsing request states from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown request state: {0}")]
pub struct ParseRequestStateError(pub String);

/// Error returned while parsing route states from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown route state: {0}")]
pub struct ParseRouteStateError(pub String);

/// Error returned while parsing leg states from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown leg state: {0}")]
pub struct ParseLegStateError(pub String);
