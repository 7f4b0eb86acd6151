//! Fallback tariffs used when a collaborator cannot supply real figures.

use serde::{Deserialize, Serialize};

/// Pricing fallbacks for estimation and real-cost computation.
///
/// Every field has a serviceable default so the engine stays operable when
/// the deployment supplies no pricing section at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    /// Per-kilometre tariff applied when no truck rate can be resolved.
    pub default_rate_per_km: f64,
    /// Daily dwell tariff applied when a deposit publishes no rates.
    pub default_daily_deposit_rate: f64,
    /// Estimated deposit days assumed when the caller supplies none.
    pub default_deposit_days: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            default_rate_per_km: 45.0,
            default_daily_deposit_rate: 150.0,
            default_deposit_days: 0.5,
        }
    }
}
