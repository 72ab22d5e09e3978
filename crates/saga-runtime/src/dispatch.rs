//! The dispatch seam a `Worker` drives for every popped envelope.

use async_trait::async_trait;
use saga_events::EventEnvelope;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("dispatch failed: {0}")]
pub struct DispatchError(pub String);

/// Handles one envelope popped from a domain queue. Implemented by
/// `ScenarioRuntime`; kept as a trait so `Worker` can be tested against a
/// stub without a full runtime.
///
/// `cancel` is the calling `Worker`'s own cancellation token: a `delayMs`
/// suspension inside `dispatch` should race against it and return early (see
/// `saga_events::delay`), but `dispatch` itself must still run to completion
/// once started — `stop()` awaits the in-flight envelope, it does not
/// abandon it, so no `set-state`/`emit` action is ever left half-applied.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn dispatch(
        &self,
        envelope: EventEnvelope,
        cancel: &CancellationToken,
    ) -> Result<(), DispatchError>;
}
