//! The per-correlation state map: the runtime's only piece of shared
//! mutable business state, written from multiple workers' dispatch loops.
//!
//! Guarded by a plain mutex and read via a deep-cloned snapshot, per the
//! teacher's guidance for systems without a dedicated actor/channel owner
//! (an `mpsc`-owned single task remains an accepted alternative — see
//! DESIGN.md).

use std::collections::HashMap;
use std::sync::Mutex;

use saga_core::CorrelationId;

pub type StateSnapshot = HashMap<CorrelationId, HashMap<String, String>>;

#[derive(Debug, Default)]
pub struct StateMap {
    inner: Mutex<StateSnapshot>,
}

impl StateMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, correlation_id: CorrelationId, domain: &str, status: impl Into<String>) {
        let mut inner = self.inner.lock().expect("state map mutex poisoned");
        inner
            .entry(correlation_id)
            .or_default()
            .insert(domain.to_string(), status.into());
    }

    /// A deep-copied view safe to inspect outside the dispatch loop.
    pub fn snapshot(&self) -> StateSnapshot {
        self.inner.lock().expect("state map mutex poisoned").clone()
    }
}
