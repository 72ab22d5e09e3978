//! Injectable clock, plus the cooperative `delay` primitive (C3).
//!
//! `delay` races its sleep against a `CancellationToken` and returns early,
//! without error, if cancelled — per spec.md's cancellation invariant: a
//! `stop()` call must let the currently-dispatched envelope finish (so no
//! action is abandoned mid-way), but any `delayMs` suspension inside it must
//! cut short so `stop()` still returns promptly rather than waiting out the
//! full delay.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

/// `now()` seam so S1–S6 can assert exact `occurred_at` values.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock fixed to one instant, for deterministic tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Suspend for `ms` milliseconds. Suspension is cooperative: other tasks
/// (other domain workers) continue to make progress while this one awaits.
/// Returns early, without error, if `cancel` fires first.
pub async fn delay(ms: u64, cancel: &CancellationToken) {
    if ms > 0 {
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_millis(ms)) => {}
            _ = cancel.cancelled() => {}
        }
    }
}
