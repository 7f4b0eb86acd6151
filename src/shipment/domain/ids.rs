//! Identifier and validated scalar types for the shipment domain.

use super::ShipmentDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an identifier from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the wrapped UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl AsRef<Uuid> for $name {
            fn as_ref(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_id! {
    /// Unique identifier for a container record.
    ContainerId
}

uuid_id! {
    /// Unique identifier for a shipping request.
    RequestId
}

uuid_id! {
    /// Unique identifier for a candidate route.
    RouteId
}

uuid_id! {
    /// Unique identifier for a leg.
    LegId
}

uuid_id! {
    /// Unique identifier for a deposit in the external deposit registry.
    DepositId
}

uuid_id! {
    /// Unique identifier for a customer.
    CustomerId
}

/// Normalized truck registration plate, the fleet registry's natural key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TruckId(String);

impl TruckId {
    /// Creates a validated truck plate.
    ///
    /// The value is trimmed and upper-cased; it must be non-empty and must
    /// not contain interior whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`ShipmentDomainError::InvalidTruckPlate`] when the value is
    /// empty after trimming or contains whitespace.
    pub fn new(value: impl Into<String>) -> Result<Self, ShipmentDomainError> {
        let raw = value.into();
        let normalized = raw.trim().to_ascii_uppercase();
        if normalized.is_empty() || normalized.chars().any(char::is_whitespace) {
            return Err(ShipmentDomainError::InvalidTruckPlate(raw));
        }
        Ok(Self(normalized))
    }

    /// Returns the plate as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for TruckId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for TruckId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One-based position of a leg within its route.
///
/// Orders are dense and unique within a route; leg `n` may only start once
/// leg `n - 1` has finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LegOrder(u32);

impl LegOrder {
    /// The first position in a route.
    pub const FIRST: Self = Self(1);

    /// Creates a validated leg order.
    ///
    /// # Errors
    ///
    /// Returns [`ShipmentDomainError::InvalidLegOrder`] when the value is
    /// zero.
    pub const fn new(value: u32) -> Result<Self, ShipmentDomainError> {
        if value == 0 {
            return Err(ShipmentDomainError::InvalidLegOrder(value));
        }
        Ok(Self(value))
    }

    /// Returns the underlying numeric value.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Returns the order of the preceding leg, or `None` for the first leg.
    #[must_use]
    pub const fn predecessor(self) -> Option<Self> {
        if self.0 > 1 { Some(Self(self.0 - 1)) } else { None }
    }

    /// Returns the order immediately after this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for LegOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
