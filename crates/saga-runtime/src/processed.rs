//! Bounded per-worker set of already-dispatched event ids.
//!
//! Unbounded growth over a long-running process would leak memory; the
//! capacity bound and FIFO eviction are an implementation necessity, not a
//! documented part of the contract — only recency matters for dedup against
//! at-least-once redelivery, not full history.

use std::collections::{HashSet, VecDeque};

use saga_core::EventId;
use tokio::sync::Mutex;

const DEFAULT_CAPACITY: usize = 10_000;

#[derive(Debug)]
pub struct ProcessedIdSet {
    capacity: usize,
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    seen: HashSet<EventId>,
    order: VecDeque<EventId>,
}

impl Default for ProcessedIdSet {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl ProcessedIdSet {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            inner: Mutex::new(Inner::default()),
        }
    }

    pub async fn is_processed(&self, id: &EventId) -> bool {
        self.inner.lock().await.seen.contains(id)
    }

    pub async fn mark_processed(&self, id: EventId) {
        let mut inner = self.inner.lock().await;
        if !inner.seen.insert(id) {
            return;
        }
        inner.order.push_back(id);
        if inner.order.len() > self.capacity
            && let Some(oldest) = inner.order.pop_front()
        {
            inner.seen.remove(&oldest);
        }
    }
}
