//! End-to-end scenario runs against the bundled `retail_order` scenario,
//! driven entirely through the public `ScenarioRuntime` surface and an
//! `InMemoryEventBus` — no access to runtime internals.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use saga_core::{CorrelationId, EventId, Payload, TraceId};
use saga_events::{BusError, Clock, EventBus, EventEnvelope, FixedClock, InMemoryEventBus, SequentialIdGenerator};
use saga_runtime::{ScenarioRuntime, ScenarioRuntimeConfig};
use serde_json::json;
use uuid::Uuid;

/// Wraps an `InMemoryEventBus` and records every envelope ever pushed per
/// queue, independent of how quickly a domain worker drains it — a plain
/// `len()` or manual `pop()` races against whichever worker is polling the
/// same queue.
#[derive(Default)]
struct RecordingEventBus {
    inner: InMemoryEventBus,
    pushed: tokio::sync::Mutex<HashMap<String, Vec<EventEnvelope>>>,
}

impl RecordingEventBus {
    async fn push_count(&self, queue: &str) -> usize {
        self.pushed.lock().await.get(queue).map(Vec::len).unwrap_or(0)
    }

    async fn first_pushed(&self, queue: &str) -> Option<EventEnvelope> {
        self.pushed.lock().await.get(queue).and_then(|v| v.first().cloned())
    }
}

#[async_trait]
impl EventBus for RecordingEventBus {
    async fn push(&self, queue: &str, envelope: EventEnvelope) -> Result<(), BusError> {
        self.inner.push(queue, envelope.clone()).await?;
        self.pushed
            .lock()
            .await
            .entry(queue.to_string())
            .or_default()
            .push(envelope);
        Ok(())
    }

    async fn pop(&self, queue: &str) -> Result<Option<EventEnvelope>, BusError> {
        self.inner.pop(queue).await
    }
}

fn load(name: &str) -> saga_scenario::Scenario {
    saga_scenario::load_scenario(&saga_scenario::bundled_dir(), name).unwrap()
}

fn fast_config() -> ScenarioRuntimeConfig {
    ScenarioRuntimeConfig {
        poll_interval: Duration::from_millis(5),
        ..ScenarioRuntimeConfig::default()
    }
}

fn payload(value: serde_json::Value) -> Payload {
    value.as_object().unwrap().clone()
}

fn envelope(event_name: &str, correlation_id: &str, data: Payload) -> EventEnvelope {
    EventEnvelope {
        event_name: event_name.to_string(),
        version: 1,
        event_id: EventId::from(Uuid::now_v7()),
        trace_id: TraceId::new("trace-1"),
        correlation_id: CorrelationId::new(correlation_id),
        occurred_at: Utc::now(),
        causation_id: None,
        data,
    }
}

async fn wait_until(mut predicate: impl FnMut() -> bool, step: Duration, max_steps: u32) -> bool {
    for _ in 0..max_steps {
        if predicate() {
            return true;
        }
        tokio::time::sleep(step).await;
    }
    predicate()
}

/// S1: the full retailer happy path runs end to end within 300ms and lands
/// every domain's per-correlation state where the listener chain says it
/// should.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn retailer_happy_path_completes_and_advances_every_domain() {
    let scenario = load("retail_order");
    let bus: Arc<dyn EventBus> = Arc::new(InMemoryEventBus::new());
    let clock: Arc<dyn Clock> = Arc::new(FixedClock(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()));
    let id_gen = Arc::new(SequentialIdGenerator::default());

    let runtime = ScenarioRuntime::with_collaborators(&scenario, Arc::clone(&bus), fast_config(), clock, id_gen);
    runtime.start().await;

    let start = tokio::time::Instant::now();
    bus.push(
        "order-queue",
        envelope(
            "OrderPlaced",
            "order-123",
            payload(json!({
                "orderId": "order-123",
                "sku": "abc",
                "quantity": 1,
                "customerName": "Ada Lovelace",
                "shippingAddress": { "line1": "1 Infinite Loop", "city": "Cupertino" }
            })),
        ),
    )
    .await
    .unwrap();

    let finished = wait_until(
        || {
            runtime
                .get_state_snapshot()
                .get(&CorrelationId::new("order-123"))
                .and_then(|d| d.get("order"))
                .map(|s| s == "CONFIRMED")
                .unwrap_or(false)
        },
        Duration::from_millis(5),
        200,
    )
    .await;
    let elapsed = start.elapsed();

    runtime.stop().await;

    assert!(finished, "saga did not reach OrderConfirmed");
    assert!(elapsed <= Duration::from_millis(300), "took {elapsed:?}, expected <= 300ms");

    let snapshot = runtime.get_state_snapshot();
    let domains = snapshot.get(&CorrelationId::new("order-123")).unwrap();
    let mut expected = HashMap::new();
    expected.insert("order".to_string(), "CONFIRMED".to_string());
    expected.insert("inventory".to_string(), "RESERVED".to_string());
    expected.insert("payments".to_string(), "AUTHORIZED".to_string());
    expected.insert("shipping".to_string(), "PREPARED".to_string());
    assert_eq!(domains, &expected);
}

/// S1 compensation branch: a reservation failure short-circuits the happy
/// path and drives order + inventory into their cancelled/failed states
/// instead, without ever touching payments or shipping.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn reservation_failure_cancels_order_without_touching_downstream_domains() {
    let scenario = load("retail_order");
    let bus: Arc<dyn EventBus> = Arc::new(InMemoryEventBus::new());
    let clock: Arc<dyn Clock> = Arc::new(FixedClock(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()));
    let id_gen = Arc::new(SequentialIdGenerator::default());

    let runtime = ScenarioRuntime::with_collaborators(&scenario, Arc::clone(&bus), fast_config(), clock, id_gen);
    runtime.start().await;

    bus.push(
        "inventory-queue",
        envelope(
            "InventoryReservationFailed",
            "order-456",
            payload(json!({ "orderId": "order-456", "sku": "abc", "reason": "out of stock" })),
        ),
    )
    .await
    .unwrap();

    let finished = wait_until(
        || {
            runtime
                .get_state_snapshot()
                .get(&CorrelationId::new("order-456"))
                .and_then(|d| d.get("order"))
                .map(|s| s == "CANCELLED")
                .unwrap_or(false)
        },
        Duration::from_millis(5),
        100,
    )
    .await;

    runtime.stop().await;

    assert!(finished, "compensation listener did not cancel the order");
    let snapshot = runtime.get_state_snapshot();
    let domains = snapshot.get(&CorrelationId::new("order-456")).unwrap();
    let mut expected = HashMap::new();
    expected.insert("order".to_string(), "CANCELLED".to_string());
    expected.insert("inventory".to_string(), "FAILED".to_string());
    assert_eq!(domains, &expected);
}

/// S2: a listener's `delayMs` is honored before its actions run — the
/// downstream emit must not appear until at least that much time has
/// passed, and must carry the triggering envelope's trace/correlation ids
/// with `causationId` set to the trigger's own event id.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn listener_delay_is_honored_before_emitting_downstream_event() {
    let scenario_json = json!({
        "name": "delayed-followup",
        "domains": [
            { "id": "source", "queue": "source-queue" },
            { "id": "target", "queue": "target-queue" }
        ],
        "events": [
            { "name": "Initial", "payloadSchema": { "id": "string" } },
            { "name": "FollowUp", "payloadSchema": { "id": "string" } }
        ],
        "listeners": [
            {
                "id": "initial-to-followup",
                "on": { "event": "Initial" },
                "delayMs": 50,
                "actions": [
                    { "type": "set-state", "domain": "source", "status": "PROCESSED" },
                    {
                        "type": "emit",
                        "event": "FollowUp",
                        "toDomain": "target",
                        "mapping": { "id": "id" }
                    }
                ]
            }
        ]
    });
    let scenario = saga_scenario::normalize_scenario(scenario_json).unwrap();

    let recording_bus = Arc::new(RecordingEventBus::default());
    let bus: Arc<dyn EventBus> = recording_bus.clone();
    let clock: Arc<dyn Clock> = Arc::new(FixedClock(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()));
    let id_gen = Arc::new(SequentialIdGenerator::default());

    let runtime = ScenarioRuntime::with_collaborators(&scenario, Arc::clone(&bus), fast_config(), clock, id_gen);
    runtime.start().await;

    let trigger = envelope("Initial", "corr-1", payload(json!({ "id": "abc" })));
    let trigger_id = trigger.event_id;
    let trigger_trace = trigger.trace_id.clone();
    let trigger_correlation = trigger.correlation_id.clone();

    let start = tokio::time::Instant::now();
    bus.push("source-queue", trigger).await.unwrap();

    let finished = wait_until(
        || {
            runtime
                .get_state_snapshot()
                .get(&CorrelationId::new("corr-1"))
                .and_then(|d| d.get("source"))
                .map(|s| s == "PROCESSED")
                .unwrap_or(false)
        },
        Duration::from_millis(5),
        100,
    )
    .await;
    assert!(finished, "listener never ran");

    let found = wait_until(
        || futures_ready(&recording_bus, "target-queue"),
        Duration::from_millis(5),
        100,
    )
    .await;
    let elapsed = start.elapsed();
    assert!(found, "downstream emit never appeared on the target queue");

    let followup = recording_bus.first_pushed("target-queue").await.unwrap();

    runtime.stop().await;

    assert!(elapsed >= Duration::from_millis(50), "emit fired before its delay elapsed: {elapsed:?}");
    assert_eq!(followup.event_name, "FollowUp");
    assert_eq!(followup.trace_id, trigger_trace);
    assert_eq!(followup.correlation_id, trigger_correlation);
    assert_eq!(followup.causation_id, Some(trigger_id));
}

fn futures_ready(bus: &Arc<RecordingEventBus>, queue: &str) -> bool {
    bus.pushed.try_lock().map(|g| g.contains_key(queue)).unwrap_or(false)
}

/// S6: redelivering the same envelope id to a domain queue dispatches it
/// at most once; the duplicate is skipped without re-running the listener
/// a second time.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn duplicate_envelope_is_dispatched_at_most_once() {
    let scenario_json = json!({
        "name": "dedup-check",
        "domains": [
            { "id": "source", "queue": "source-queue" },
            { "id": "sink", "queue": "sink-queue" }
        ],
        "events": [
            { "name": "Initial", "payloadSchema": { "id": "string" } },
            { "name": "Done", "payloadSchema": { "id": "string" } }
        ],
        "listeners": [
            {
                "id": "initial-to-done",
                "on": { "event": "Initial" },
                "actions": [
                    {
                        "type": "emit",
                        "event": "Done",
                        "toDomain": "sink",
                        "mapping": { "id": "id" }
                    }
                ]
            }
        ]
    });
    let scenario = saga_scenario::normalize_scenario(scenario_json).unwrap();

    let counting_bus = Arc::new(RecordingEventBus::default());
    let bus: Arc<dyn EventBus> = counting_bus.clone();
    let clock: Arc<dyn Clock> = Arc::new(FixedClock(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()));
    let id_gen = Arc::new(SequentialIdGenerator::default());

    let runtime = ScenarioRuntime::with_collaborators(&scenario, Arc::clone(&bus), fast_config(), clock, id_gen);
    runtime.start().await;

    let original = envelope("Initial", "corr-dup", payload(json!({ "id": "abc" })));
    let redelivered = original.clone();

    bus.push("source-queue", original).await.unwrap();
    for _ in 0..100 {
        if counting_bus.push_count("sink-queue").await == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(counting_bus.push_count("sink-queue").await, 1, "listener never ran");

    // Simulate at-least-once redelivery: the exact same envelope id lands
    // on the queue again.
    bus.push("source-queue", redelivered).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    runtime.stop().await;

    assert_eq!(
        counting_bus.push_count("sink-queue").await,
        1,
        "duplicate delivery produced a second Done event"
    );
}
