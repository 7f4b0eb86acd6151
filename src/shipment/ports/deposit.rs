//! Deposit registry port: read-only deposit addresses and dwell tariffs.

use crate::shipment::domain::DepositId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Result type for deposit registry operations.
pub type DepositResult<T> = Result<T, DepositError>;

/// Deposit record exposed by the deposit registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deposit {
    /// Registry identifier.
    pub id: DepositId,
    /// Display name.
    pub name: String,
    /// Registered street address, used for geocoding leg stops.
    pub address: String,
    /// Explicit dwell tariff per hour, when the deposit publishes one.
    pub hourly_rate: Option<f64>,
    /// Dwell tariff per day, used when no hourly tariff is published.
    pub daily_rate: Option<f64>,
}

impl Deposit {
    /// Returns the hourly dwell tariff: the explicit hourly rate when
    /// published, else the daily rate divided by 24.
    #[must_use]
    pub fn effective_hourly_rate(&self) -> Option<f64> {
        self.hourly_rate.or_else(|| self.daily_rate.map(|daily| daily / 24.0))
    }
}

/// Read-only access to the deposit registry.
#[async_trait]
pub trait DepositPort: Send + Sync {
    /// Looks up a single deposit.
    ///
    /// # Errors
    ///
    /// Returns [`DepositError::DepositNotFound`] when the identifier is
    /// unknown and [`DepositError::Unavailable`] when the registry cannot be
    /// reached.
    async fn get_deposit(&self, id: DepositId) -> DepositResult<Deposit>;
}

/// Errors returned by deposit registry implementations.
#[derive(Debug, Clone, Error)]
pub enum DepositError {
    /// No deposit is registered under the given identifier.
    #[error("deposit not found: {0}")]
    DepositNotFound(DepositId),

    /// The registry could not be reached.
    #[error("deposit registry unavailable: {0}")]
    Unavailable(Arc<dyn std::error::Error + Send + Sync>),
}

impl DepositError {
    /// Wraps a transport-level failure.
    pub fn unavailable(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Unavailable(Arc::new(err))
    }
}
