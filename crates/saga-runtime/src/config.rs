//! Runtime configuration loaded from environment variables, following the
//! teacher's convention: no dedicated config crate, read `std::env::var`,
//! log a warning and fall back to a hardcoded default rather than failing.

use std::time::Duration;

use saga_events::RetryPolicy;
use tracing::warn;

#[derive(Debug, Clone, Copy)]
pub struct ScenarioRuntimeConfig {
    pub poll_interval: Duration,
    pub retry: RetryPolicy,
}

impl Default for ScenarioRuntimeConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(250),
            retry: RetryPolicy::default(),
        }
    }
}

impl ScenarioRuntimeConfig {
    /// Reads `SAGA_POLL_INTERVAL_MS`, `SAGA_RETRY_MAX_ATTEMPTS`, and
    /// `SAGA_RETRY_BASE_MS`. Missing or unparsable values fall back to the
    /// default with a logged warning; this never fails.
    pub fn from_env() -> Self {
        let default = Self::default();

        let poll_interval = env_u64("SAGA_POLL_INTERVAL_MS")
            .map(Duration::from_millis)
            .unwrap_or(default.poll_interval);

        let retries = env_u64("SAGA_RETRY_MAX_ATTEMPTS")
            .map(|v| v as u32)
            .unwrap_or(default.retry.retries);

        let base = env_u64("SAGA_RETRY_BASE_MS")
            .map(Duration::from_millis)
            .unwrap_or(default.retry.base);

        Self {
            poll_interval,
            retry: RetryPolicy { retries, base },
        }
    }
}

fn env_u64(key: &str) -> Option<u64> {
    match std::env::var(key) {
        Ok(raw) => match raw.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(key, raw, "failed to parse environment variable, using default");
                None
            }
        },
        Err(_) => None,
    }
}
