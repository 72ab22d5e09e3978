//! Publication retry with exponential backoff (C3).
//!
//! An explicit bounded loop, not exceptions for control flow: transport
//! errors are retried, validation errors are caller bugs and surface
//! immediately.

use std::time::Duration;

use tracing::warn;

use crate::bus::{BusError, EventBus};
use crate::envelope::EventEnvelope;

/// Retry policy for `publish_with_retry`.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub retries: u32,
    pub base: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 3,
            base: Duration::from_millis(100),
        }
    }
}

/// Publish `envelope` to `queue`, retrying transport errors with
/// exponential backoff `base * 2^(attempt-1)`. Total attempts is
/// `retries + 1`. Validation errors are never retried; on retry
/// exhaustion the final error is returned.
pub async fn publish_with_retry(
    bus: &dyn EventBus,
    queue: &str,
    envelope: EventEnvelope,
    policy: RetryPolicy,
) -> Result<(), BusError> {
    let mut attempt: u32 = 0;

    loop {
        match bus.push(queue, envelope.clone()).await {
            Ok(()) => return Ok(()),
            Err(err) if !err.is_retriable() => return Err(err),
            Err(err) => {
                if attempt >= policy.retries {
                    return Err(err);
                }

                let delay = policy.base * 2u32.pow(attempt);
                warn!(
                    queue,
                    attempt,
                    error = %err,
                    delay_ms = delay.as_millis() as u64,
                    "publish failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
