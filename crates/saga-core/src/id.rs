//! Strongly-typed identifiers used across the saga engine.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SagaError;

/// Identifier of an event envelope.
///
/// Used for deduplication and as the causation id of any event it triggers.
/// Minted as UUIDv4: event ids only need global uniqueness, not the
/// time-ordering that aggregate ids elsewhere in this codebase family rely
/// on UUIDv7 for.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(Uuid);

impl EventId {
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl core::fmt::Display for EventId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<Uuid> for EventId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<EventId> for Uuid {
    fn from(value: EventId) -> Self {
        value.0
    }
}

impl FromStr for EventId {
    type Err = SagaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uuid =
            Uuid::from_str(s).map_err(|e| SagaError::invalid_id(format!("EventId: {e}")))?;
        Ok(Self(uuid))
    }
}

macro_rules! impl_opaque_string_id {
    ($(#[$doc:meta])* $t:ident, $name:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $t(String);

        impl $t {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $t {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $t {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl AsRef<str> for $t {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

impl_opaque_string_id!(
    /// Opaque identifier propagated unchanged across every hop of a saga
    /// instance; carries no business meaning of its own.
    TraceId,
    "TraceId"
);

impl_opaque_string_id!(
    /// Saga-instance identifier, typically the business aggregate id (e.g.
    /// the order id). Keys the runtime's per-correlation state map.
    CorrelationId,
    "CorrelationId"
);

impl_opaque_string_id!(
    /// Identifier of a declared domain (e.g. `"inventory"`), distinct from
    /// its queue name.
    DomainId,
    "DomainId"
);
