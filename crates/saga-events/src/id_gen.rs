//! Injectable id generation, so S1–S6 can assert exact `event_id` values.

use std::sync::atomic::{AtomicU64, Ordering};

use saga_core::EventId;
use uuid::Uuid;

pub trait IdGenerator: Send + Sync {
    fn fresh_id(&self) -> EventId;
}

/// UUIDv4 generator, matching the spec's recommendation for event ids
/// (identity only, no time-ordering requirement).
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidV4Generator;

impl IdGenerator for UuidV4Generator {
    fn fresh_id(&self) -> EventId {
        EventId::from(Uuid::new_v4())
    }
}

/// Deterministic generator for tests: produces ids from a counter encoded
/// into a UUID's low bits.
#[derive(Debug, Default)]
pub struct SequentialIdGenerator {
    next: AtomicU64,
}

impl IdGenerator for SequentialIdGenerator {
    fn fresh_id(&self) -> EventId {
        let n = self.next.fetch_add(1, Ordering::SeqCst);
        EventId::from(Uuid::from_u128(n as u128))
    }
}
