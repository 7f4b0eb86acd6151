//! Geocoding port: distance and travel duration between two addresses.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Result type for geocoding operations.
pub type GeoResult<T> = Result<T, GeoError>;

/// Driving metrics between two resolved addresses.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteMetrics {
    /// Driving distance in kilometres.
    pub distance_km: f64,
    /// Driving duration in minutes.
    pub duration_minutes: i64,
}

impl RouteMetrics {
    /// Returns the driving duration in fractional hours.
    #[must_use]
    pub fn duration_hours(&self) -> f64 {
        self.duration_minutes as f64 / 60.0
    }
}

/// Read-only access to the geocoding/routing collaborator.
#[async_trait]
pub trait GeoPort: Send + Sync {
    /// Resolves the driving distance and duration between two addresses.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::NoRoute`] when the collaborator cannot route
    /// between the addresses and [`GeoError::Unavailable`] when it cannot be
    /// reached.
    async fn distance(&self, origin: &str, destination: &str) -> GeoResult<RouteMetrics>;
}

/// Errors returned by geocoding implementations.
#[derive(Debug, Clone, Error)]
pub enum GeoError {
    /// The collaborator found no drivable route between the addresses.
    #[error("no route between {origin:?} and {destination:?}")]
    NoRoute {
        /// Resolved origin address.
        origin: String,
        /// Resolved destination address.
        destination: String,
    },

    /// The collaborator could not be reached.
    #[error("geocoding service unavailable: {0}")]
    Unavailable(Arc<dyn std::error::Error + Send + Sync>),
}

impl GeoError {
    /// Wraps a transport-level failure.
    pub fn unavailable(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Unavailable(Arc::new(err))
    }
}
