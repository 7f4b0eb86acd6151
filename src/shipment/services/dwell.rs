//! Dwell accounting: idle time at a deposit between two consecutive legs.

use crate::shipment::domain::{DepositId, Leg, hours_between};
use chrono::{DateTime, Utc};
use tracing::warn;

/// Dwell accrued at a deposit before a leg began, prior to pricing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingDwell {
    /// The deposit the container waited at.
    pub deposit_id: DepositId,
    /// Hours waited.
    pub hours: f64,
}

/// Computes the dwell a container accrued between the end of `previous` and
/// `started_at`, the real start of the following leg.
///
/// Returns `None` — zero dwell, not an error — when the previous leg did not
/// end at a deposit, when a real timestamp is missing, or when the interval
/// is not positive.
#[must_use]
pub fn dwell_before(previous: &Leg, started_at: DateTime<Utc>) -> Option<PendingDwell> {
    let deposit_id = previous.destination().deposit_id()?;
    let Some(previous_end) = previous.actual_end() else {
        warn!(
            previous_leg = %previous.id(),
            "previous leg has no real end timestamp, skipping dwell"
        );
        return None;
    };

    let hours = hours_between(previous_end, started_at);
    if hours <= 0.0 {
        return None;
    }
    Some(PendingDwell { deposit_id, hours })
}
