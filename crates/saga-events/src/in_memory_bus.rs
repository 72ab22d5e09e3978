//! In-memory event bus for tests and single-process deployments.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::bus::{BusError, EventBus};
use crate::envelope::EventEnvelope;

/// Per-queue FIFO bus backed by an in-process map.
///
/// A pop removes the envelope — there is no redelivery on this reference
/// implementation. Empty queues are pruned so the map doesn't grow
/// unbounded with one-shot queue names.
#[derive(Debug, Default)]
pub struct InMemoryEventBus {
    queues: Mutex<HashMap<String, VecDeque<EventEnvelope>>>,
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current length of a queue; mainly useful for tests asserting on
    /// queue state without popping.
    pub async fn len(&self, queue: &str) -> usize {
        self.queues
            .lock()
            .await
            .get(queue)
            .map(VecDeque::len)
            .unwrap_or(0)
    }
}

#[async_trait]
impl EventBus for InMemoryEventBus {
    async fn push(&self, queue: &str, envelope: EventEnvelope) -> Result<(), BusError> {
        envelope.validate()?;
        self.queues
            .lock()
            .await
            .entry(queue.to_string())
            .or_default()
            .push_back(envelope);
        Ok(())
    }

    async fn pop(&self, queue: &str) -> Result<Option<EventEnvelope>, BusError> {
        let mut queues = self.queues.lock().await;
        let Some(q) = queues.get_mut(queue) else {
            return Ok(None);
        };
        let envelope = q.pop_front();
        if q.is_empty() {
            queues.remove(queue);
        }
        if let Some(ref envelope) = envelope {
            envelope.validate()?;
        }
        Ok(envelope)
    }
}
