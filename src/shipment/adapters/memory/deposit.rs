//! In-memory deposit registry for tests and embedding.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::shipment::domain::DepositId;
use crate::shipment::ports::{Deposit, DepositError, DepositPort, DepositResult};

/// Thread-safe in-memory deposit registry.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDepositRegistry {
    state: Arc<RwLock<DepositState>>,
}

#[derive(Debug, Default)]
struct DepositState {
    deposits: HashMap<DepositId, Deposit>,
    unavailable: bool,
}

impl InMemoryDepositRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a deposit record.
    pub fn upsert_deposit(&self, deposit: Deposit) {
        if let Ok(mut state) = self.state.write() {
            state.deposits.insert(deposit.id, deposit);
        }
    }

    /// Toggles a simulated registry outage.
    pub fn set_unavailable(&self, unavailable: bool) {
        if let Ok(mut state) = self.state.write() {
            state.unavailable = unavailable;
        }
    }
}

#[async_trait]
impl DepositPort for InMemoryDepositRegistry {
    async fn get_deposit(&self, id: DepositId) -> DepositResult<Deposit> {
        let state = self
            .state
            .read()
            .map_err(|err| DepositError::unavailable(std::io::Error::other(err.to_string())))?;
        if state.unavailable {
            return Err(DepositError::unavailable(std::io::Error::other(
                "deposit registry offline",
            )));
        }
        state
            .deposits
            .get(&id)
            .cloned()
            .ok_or(DepositError::DepositNotFound(id))
    }
}
