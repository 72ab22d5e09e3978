//! Shared identifiers and error taxonomy used across the saga engine crates.

pub mod error;
pub mod id;

pub use error::SagaError;
pub use id::{CorrelationId, DomainId, EventId, TraceId};

/// Free-form event payload; re-exported so downstream crates don't each
/// pull in `serde_json` directly for this one type.
pub type Payload = serde_json::Map<String, serde_json::Value>;
