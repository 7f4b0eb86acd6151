//! Final cost/time consolidation over the selected route's legs.

use crate::shipment::domain::{Leg, ShipmentTotals};

/// Sums per-leg estimates and actuals into request-level totals.
///
/// Recomputes from the source legs on every call, so re-invocation after
/// delivery refreshes the same figures instead of accumulating. Unrecorded
/// per-leg figures count as zero.
#[must_use]
pub fn consolidate(legs: &[Leg]) -> ShipmentTotals {
    let mut totals = ShipmentTotals {
        estimated_cost: 0.0,
        real_cost: 0.0,
        estimated_hours: 0.0,
        real_hours: 0.0,
    };
    for leg in legs {
        totals.estimated_cost += leg.estimated_cost();
        totals.real_cost += leg.actual_cost().unwrap_or(0.0) + leg.dwell_cost().unwrap_or(0.0);
        totals.estimated_hours += leg.planned_hours().unwrap_or(0.0);
        totals.real_hours += leg.actual_hours().unwrap_or(0.0) + leg.dwell_hours().unwrap_or(0.0);
    }
    totals
}
