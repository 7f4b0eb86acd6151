//! In-memory fleet registry for tests and embedding.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::shipment::domain::TruckId;
use crate::shipment::ports::{FleetError, FleetPort, FleetResult, Truck};

/// Thread-safe in-memory fleet registry.
#[derive(Debug, Clone, Default)]
pub struct InMemoryFleetRegistry {
    state: Arc<RwLock<FleetState>>,
}

#[derive(Debug, Default)]
struct FleetState {
    trucks: HashMap<TruckId, Truck>,
    unavailable: bool,
}

impl InMemoryFleetRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a truck record.
    pub fn upsert_truck(&self, truck: Truck) {
        if let Ok(mut state) = self.state.write() {
            state.trucks.insert(truck.id.clone(), truck);
        }
    }

    /// Toggles a simulated registry outage.
    pub fn set_unavailable(&self, unavailable: bool) {
        if let Ok(mut state) = self.state.write() {
            state.unavailable = unavailable;
        }
    }
}

fn registry_read(
    state: &Arc<RwLock<FleetState>>,
) -> FleetResult<std::sync::RwLockReadGuard<'_, FleetState>> {
    let guard = state
        .read()
        .map_err(|err| FleetError::unavailable(std::io::Error::other(err.to_string())))?;
    if guard.unavailable {
        return Err(FleetError::unavailable(std::io::Error::other(
            "fleet registry offline",
        )));
    }
    Ok(guard)
}

#[async_trait]
impl FleetPort for InMemoryFleetRegistry {
    async fn get_truck(&self, id: &TruckId) -> FleetResult<Truck> {
        let state = registry_read(&self.state)?;
        state
            .trucks
            .get(id)
            .cloned()
            .ok_or_else(|| FleetError::TruckNotFound(id.clone()))
    }

    async fn list_trucks(&self) -> FleetResult<Vec<Truck>> {
        let state = registry_read(&self.state)?;
        Ok(state.trucks.values().cloned().collect())
    }
}
