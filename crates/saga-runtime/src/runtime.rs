//! The scenario runtime (C7): indexes a validated `Scenario`, dispatches
//! popped envelopes through its listeners, and owns the per-queue workers.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use saga_events::{
    delay, publish_with_retry, Clock, EventBus, EventEnvelope, IdGenerator, SystemClock,
    UuidV4Generator,
};
use saga_mapping::apply_emit_mapping;
use saga_scenario::{Listener, ListenerAction, Scenario};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::config::ScenarioRuntimeConfig;
use crate::dispatch::{DispatchError, Dispatcher};
use crate::state::{StateMap, StateSnapshot};
use crate::worker::Worker;

struct RuntimeCore {
    listeners_by_event: HashMap<String, Vec<Listener>>,
    queue_by_domain: HashMap<String, String>,
    payload_schema_by_event: HashMap<String, saga_scenario::PayloadSchema>,
    bus: Arc<dyn EventBus>,
    clock: Arc<dyn Clock>,
    id_gen: Arc<dyn IdGenerator>,
    config: ScenarioRuntimeConfig,
    state: StateMap,
}

#[async_trait]
impl Dispatcher for RuntimeCore {
    async fn dispatch(
        &self,
        envelope: EventEnvelope,
        cancel: &CancellationToken,
    ) -> Result<(), DispatchError> {
        let Some(listeners) = self.listeners_by_event.get(&envelope.event_name) else {
            debug!(event_name = %envelope.event_name, "no listener for event");
            return Ok(());
        };

        for listener in listeners {
            if let Some(ms) = listener.delay_ms
                && ms > 0
            {
                delay(ms, cancel).await;
            }

            for action in &listener.actions {
                self.execute_action(&envelope, action, cancel).await;
            }
        }

        Ok(())
    }
}

impl RuntimeCore {
    async fn execute_action(
        &self,
        source: &EventEnvelope,
        action: &ListenerAction,
        cancel: &CancellationToken,
    ) {
        match action {
            ListenerAction::SetState { domain, status } => {
                self.state
                    .set(source.correlation_id.clone(), domain, status.clone());
            }
            ListenerAction::Emit {
                event,
                to_domain,
                mapping,
                delay_ms,
            } => {
                self.emit(source, event, to_domain, mapping.as_ref(), *delay_ms, cancel)
                    .await
            }
        }
    }

    async fn emit(
        &self,
        source: &EventEnvelope,
        event: &str,
        to_domain: &str,
        mapping: Option<&saga_scenario::EmitMapping>,
        delay_ms: Option<u64>,
        cancel: &CancellationToken,
    ) {
        let Some(destination_schema) = self.payload_schema_by_event.get(event) else {
            error!(event, "emit action references an unindexed event; scenario should have rejected this at load time");
            return;
        };
        let Some(queue) = self.queue_by_domain.get(to_domain) else {
            error!(to_domain, "emit action references an unindexed domain; scenario should have rejected this at load time");
            return;
        };

        let data = apply_emit_mapping(&source.data, destination_schema, mapping, &mut |w| {
            warn!(path = %w.path, message = %w.message, event, "mapping warning");
        });

        let new_envelope = EventEnvelope {
            event_name: event.to_string(),
            version: 1,
            event_id: self.id_gen.fresh_id(),
            trace_id: source.trace_id.clone(),
            correlation_id: source.correlation_id.clone(),
            occurred_at: self.clock.now(),
            causation_id: Some(source.event_id),
            data,
        };

        if let Some(ms) = delay_ms
            && ms > 0
        {
            delay(ms, cancel).await;
        }

        if let Err(err) =
            publish_with_retry(self.bus.as_ref(), queue, new_envelope, self.config.retry).await
        {
            error!(queue, event, error = %err, "emit publish failed after retries, dropping");
        }
    }
}

/// Owns the indexed scenario, the shared dispatch core, and one `Worker`
/// per declared domain.
pub struct ScenarioRuntime {
    core: Arc<RuntimeCore>,
    workers: Vec<Arc<Worker>>,
}

impl ScenarioRuntime {
    pub fn new(scenario: &Scenario, bus: Arc<dyn EventBus>, config: ScenarioRuntimeConfig) -> Arc<Self> {
        Self::with_collaborators(
            scenario,
            bus,
            config,
            Arc::new(SystemClock),
            Arc::new(UuidV4Generator),
        )
    }

    pub fn with_collaborators(
        scenario: &Scenario,
        bus: Arc<dyn EventBus>,
        config: ScenarioRuntimeConfig,
        clock: Arc<dyn Clock>,
        id_gen: Arc<dyn IdGenerator>,
    ) -> Arc<Self> {
        let mut listeners_by_event: HashMap<String, Vec<Listener>> = HashMap::new();
        for listener in &scenario.listeners {
            listeners_by_event
                .entry(listener.on.event.clone())
                .or_default()
                .push(listener.clone());
        }

        let queue_by_domain = scenario
            .domains
            .iter()
            .map(|d| (d.id.clone(), d.queue.clone()))
            .collect();

        let payload_schema_by_event = scenario
            .events
            .iter()
            .map(|e| (e.name.clone(), e.payload_schema.clone()))
            .collect();

        let core = Arc::new(RuntimeCore {
            listeners_by_event,
            queue_by_domain,
            payload_schema_by_event,
            bus,
            clock,
            id_gen,
            config,
            state: StateMap::new(),
        });

        let workers = scenario
            .domains
            .iter()
            .map(|domain| {
                Worker::with_config(
                    domain.queue.clone(),
                    Arc::clone(&core.bus),
                    core.clone() as Arc<dyn Dispatcher>,
                    config.poll_interval,
                    10_000,
                )
            })
            .collect();

        Arc::new(Self { core, workers })
    }

    pub async fn start(&self) {
        for worker in &self.workers {
            worker.start().await;
        }
    }

    pub async fn stop(&self) {
        for worker in &self.workers {
            worker.stop().await;
        }
    }

    pub fn get_state_snapshot(&self) -> StateSnapshot {
        self.core.state.snapshot()
    }

    /// Expose the bus so callers can push the initial triggering envelope.
    pub fn bus(&self) -> Arc<dyn EventBus> {
        Arc::clone(&self.core.bus)
    }
}

