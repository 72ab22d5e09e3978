//! Event bus abstraction: per-queue FIFO push/pop (mechanics only).
//!
//! At-least-once delivery is acceptable; consumers must be idempotent. The
//! bus makes no assumptions about storage or transport — see
//! `in_memory_bus` and `remote_bus` for the two implementations in scope.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::envelope::{EnvelopeError, EventEnvelope};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BusError {
    /// The envelope failed validation; never retried.
    #[error(transparent)]
    Invalid(#[from] EnvelopeError),

    /// A transport-level failure (network, broker error); retriable.
    #[error("transport error: {0}")]
    Transport(String),
}

impl BusError {
    pub fn is_retriable(&self) -> bool {
        matches!(self, BusError::Transport(_))
    }
}

/// Per-queue FIFO event bus.
///
/// `push` validates the envelope before appending; `pop` removes and
/// returns the head envelope of the named queue, or `None` if empty.
/// Ordering is guaranteed only within a single queue — there is no
/// cross-queue ordering guarantee.
#[async_trait]
pub trait EventBus: Send + Sync {
    async fn push(&self, queue: &str, envelope: EventEnvelope) -> Result<(), BusError>;

    async fn pop(&self, queue: &str) -> Result<Option<EventEnvelope>, BusError>;
}

#[async_trait]
impl<B> EventBus for Arc<B>
where
    B: EventBus + ?Sized,
{
    async fn push(&self, queue: &str, envelope: EventEnvelope) -> Result<(), BusError> {
        (**self).push(queue, envelope).await
    }

    async fn pop(&self, queue: &str) -> Result<Option<EventEnvelope>, BusError> {
        (**self).pop(queue).await
    }
}
