//! `with_timeout`: race an operation against a deadline (C3).

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("timed out after {0}ms")]
pub struct TimeoutError(pub u64);

/// Race `fut` against a deadline of `ms` milliseconds. `ms` must be
/// positive. On success the timer is implicitly cancelled (the underlying
/// `tokio::time::Sleep` is dropped); on deadline the future is cancelled
/// and `TimeoutError` is returned.
pub async fn with_timeout<F, T>(fut: F, ms: u64) -> Result<T, TimeoutError>
where
    F: Future<Output = T>,
{
    debug_assert!(ms > 0, "with_timeout requires a positive deadline");
    tokio::time::timeout(Duration::from_millis(ms), fut)
        .await
        .map_err(|_| TimeoutError(ms))
}
