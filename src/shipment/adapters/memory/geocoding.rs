//! Keyed-table geocoding stub for tests and embedding.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::shipment::ports::{GeoError, GeoPort, GeoResult, RouteMetrics};

/// Geocoding service answering from a fixed origin/destination table.
#[derive(Debug, Clone, Default)]
pub struct StaticGeoService {
    state: Arc<RwLock<GeoState>>,
}

#[derive(Debug, Default)]
struct GeoState {
    routes: HashMap<(String, String), RouteMetrics>,
    fallback: Option<RouteMetrics>,
    unavailable: bool,
}

impl StaticGeoService {
    /// Creates an empty table; every lookup fails until routes are added.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the metrics answered for a specific origin/destination pair.
    pub fn set_route(
        &self,
        origin: impl Into<String>,
        destination: impl Into<String>,
        metrics: RouteMetrics,
    ) {
        if let Ok(mut state) = self.state.write() {
            state
                .routes
                .insert((origin.into(), destination.into()), metrics);
        }
    }

    /// Sets the metrics answered for pairs absent from the table.
    pub fn set_fallback(&self, metrics: RouteMetrics) {
        if let Ok(mut state) = self.state.write() {
            state.fallback = Some(metrics);
        }
    }

    /// Toggles a simulated collaborator outage.
    pub fn set_unavailable(&self, unavailable: bool) {
        if let Ok(mut state) = self.state.write() {
            state.unavailable = unavailable;
        }
    }
}

#[async_trait]
impl GeoPort for StaticGeoService {
    async fn distance(&self, origin: &str, destination: &str) -> GeoResult<RouteMetrics> {
        let state = self
            .state
            .read()
            .map_err(|err| GeoError::unavailable(std::io::Error::other(err.to_string())))?;
        if state.unavailable {
            return Err(GeoError::unavailable(std::io::Error::other(
                "geocoding service offline",
            )));
        }
        state
            .routes
            .get(&(origin.to_owned(), destination.to_owned()))
            .copied()
            .or(state.fallback)
            .ok_or_else(|| GeoError::NoRoute {
                origin: origin.to_owned(),
                destination: destination.to_owned(),
            })
    }
}
