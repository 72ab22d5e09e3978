//! Per-queue worker loop (C4): pop → dedup → dispatch → reschedule.
//!
//! Async rewrite of the teacher's thread-based `ProjectionWorker`, restated
//! on cooperative tokio tasks: one task per domain queue, a cancellation
//! token racing the poll timer and any in-flight delay so `stop()` returns
//! promptly.

use std::sync::Arc;
use std::time::Duration;

use saga_events::EventBus;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::dispatch::Dispatcher;
use crate::processed::ProcessedIdSet;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Drives one domain queue: idempotent `start`/`stop`, at most one dispatch
/// in flight, at most one pending timer.
pub struct Worker {
    queue: String,
    bus: Arc<dyn EventBus>,
    dispatcher: Arc<dyn Dispatcher>,
    processed: Arc<ProcessedIdSet>,
    poll_interval: Duration,
    cancel: CancellationToken,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Worker {
    pub fn new(
        queue: impl Into<String>,
        bus: Arc<dyn EventBus>,
        dispatcher: Arc<dyn Dispatcher>,
    ) -> Arc<Self> {
        Self::with_config(queue, bus, dispatcher, DEFAULT_POLL_INTERVAL, 10_000)
    }

    pub fn with_config(
        queue: impl Into<String>,
        bus: Arc<dyn EventBus>,
        dispatcher: Arc<dyn Dispatcher>,
        poll_interval: Duration,
        processed_capacity: usize,
    ) -> Arc<Self> {
        Arc::new(Self {
            queue: queue.into(),
            bus,
            dispatcher,
            processed: Arc::new(ProcessedIdSet::with_capacity(processed_capacity)),
            poll_interval,
            cancel: CancellationToken::new(),
            handle: Mutex::new(None),
        })
    }

    /// Idempotent: a second call while already running is a no-op.
    pub async fn start(self: &Arc<Self>) {
        let mut handle = self.handle.lock().await;
        if handle.is_some() {
            return;
        }
        let worker = Arc::clone(self);
        *handle = Some(tokio::spawn(async move { worker.run().await }));
    }

    /// Idempotent: cancels the pending timer, awaits the in-flight
    /// iteration to drain, swallows its result.
    pub async fn stop(&self) {
        self.cancel.cancel();
        let mut handle = self.handle.lock().await;
        if let Some(join) = handle.take() {
            let _ = join.await;
        }
    }

    async fn run(self: Arc<Self>) {
        loop {
            if self.cancel.is_cancelled() {
                return;
            }

            let reschedule_immediately = self.run_iteration().await;

            if reschedule_immediately {
                continue;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                _ = self.cancel.cancelled() => return,
            }
        }
    }

    /// Runs one pop→dispatch cycle. Returns `true` if the next iteration
    /// should start immediately (duplicate or successful dispatch),
    /// `false` if it should wait out `poll_interval` (empty queue or
    /// dispatch failure).
    async fn run_iteration(&self) -> bool {
        let envelope = match self.bus.pop(&self.queue).await {
            Ok(Some(envelope)) => envelope,
            Ok(None) => return false,
            Err(err) => {
                error!(queue = %self.queue, error = %err, "bus pop failed");
                return false;
            }
        };

        let id = envelope.event_id;
        if self.processed.is_processed(&id).await {
            debug!(queue = %self.queue, event_id = %id, "duplicate envelope, skipping");
            return true;
        }

        // Runs to completion even if `self.cancel` fires mid-flight: `stop()`
        // awaits this same call via `run()`'s loop, it doesn't abort it. Any
        // `delayMs` suspension inside races its own cancellation check (see
        // `saga_events::delay`) so a pending stop still doesn't wait out the
        // full delay.
        match self.dispatcher.dispatch(envelope, &self.cancel).await {
            Ok(()) => {
                self.processed.mark_processed(id).await;
                true
            }
            Err(err) => {
                error!(queue = %self.queue, event_id = %id, error = %err, "dispatch failed");
                false
            }
        }
    }
}
