//! Drives a `ScenarioRuntime` through its real public surface: load the
//! bundled scenario, push a triggering envelope on an `InMemoryEventBus`,
//! and print the resulting state snapshot and timings.
//!
//! Run with: `cargo run -p saga-runtime --example drive_scenario`

use std::sync::Arc;
use std::time::{Duration, Instant};

use saga_core::{CorrelationId, EventId, Payload, TraceId};
use saga_events::{EventBus, EventEnvelope, InMemoryEventBus};
use saga_runtime::{ScenarioRuntime, ScenarioRuntimeConfig};
use serde_json::json;
use uuid::Uuid;

fn payload(value: serde_json::Value) -> Payload {
    value.as_object().unwrap().clone()
}

#[tokio::main]
async fn main() {
    saga_observability::tracing::init();

    println!("== retail_order happy path ==");
    let scenario = saga_scenario::load_scenario(&saga_scenario::bundled_dir(), "retail_order")
        .expect("bundled scenario should load");
    let bus: Arc<dyn EventBus> = Arc::new(InMemoryEventBus::new());
    let runtime = ScenarioRuntime::new(
        &scenario,
        Arc::clone(&bus),
        ScenarioRuntimeConfig {
            poll_interval: Duration::from_millis(5),
            ..ScenarioRuntimeConfig::default()
        },
    );
    runtime.start().await;

    let correlation = CorrelationId::new("order-demo-1");
    bus.push(
        "order-queue",
        EventEnvelope {
            event_name: "OrderPlaced".to_string(),
            version: 1,
            event_id: EventId::from(Uuid::now_v7()),
            trace_id: TraceId::new("trace-demo-1"),
            correlation_id: correlation.clone(),
            occurred_at: chrono::Utc::now(),
            causation_id: None,
            data: payload(json!({
                "orderId": "ORD-1",
                "sku": "SKU-1",
                "quantity": 1,
                "customerName": "Ada",
                "shippingAddress": {"line1": "1 Main St", "city": "Springfield"}
            })),
        },
    )
    .await
    .unwrap();

    let start = Instant::now();
    loop {
        let snapshot = runtime.get_state_snapshot();
        let order_state = snapshot.get(&correlation).and_then(|d| d.get("order")).cloned();
        if order_state.as_deref() == Some("CONFIRMED") {
            break;
        }
        if start.elapsed() > Duration::from_secs(5) {
            panic!("saga did not reach OrderConfirmed within 5s");
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    let elapsed = start.elapsed();
    runtime.stop().await;

    let snapshot = runtime.get_state_snapshot();
    let domains = snapshot.get(&correlation).unwrap();
    println!("completed in {elapsed:?}");
    println!("final state: {domains:?}");
    assert_eq!(domains.get("payments").map(String::as_str), Some("AUTHORIZED"));

    println!("\n== stop() responsiveness under a long in-flight delay ==");
    let slow_scenario = saga_scenario::normalize_scenario(json!({
        "name": "slow-demo",
        "domains": [
            {"id": "source", "queue": "source-queue"},
            {"id": "target", "queue": "target-queue"}
        ],
        "events": [
            {"name": "Initial", "payloadSchema": {"marker": "string"}},
            {"name": "FollowUp", "payloadSchema": {"marker": "string"}}
        ],
        "listeners": [{
            "id": "slow-listener",
            "on": {"event": "Initial"},
            "delayMs": 2000,
            "actions": [
                {"type": "emit", "event": "FollowUp", "toDomain": "target", "mapping": {"marker": "marker"}}
            ]
        }]
    }))
    .expect("inline scenario should normalize");

    let slow_bus: Arc<dyn EventBus> = Arc::new(InMemoryEventBus::new());
    let slow_runtime = ScenarioRuntime::new(
        &slow_scenario,
        Arc::clone(&slow_bus),
        ScenarioRuntimeConfig {
            poll_interval: Duration::from_millis(5),
            ..ScenarioRuntimeConfig::default()
        },
    );
    slow_runtime.start().await;
    slow_bus
        .push(
            "source-queue",
            EventEnvelope {
                event_name: "Initial".to_string(),
                version: 1,
                event_id: EventId::from(Uuid::now_v7()),
                trace_id: TraceId::new("trace-demo-2"),
                correlation_id: CorrelationId::new("order-demo-2"),
                occurred_at: chrono::Utc::now(),
                causation_id: None,
                data: payload(json!({"marker": "hello"})),
            },
        )
        .await
        .unwrap();

    // Give the worker a moment to pop the envelope and enter the 2s delay.
    tokio::time::sleep(Duration::from_millis(50)).await;
    let stop_start = Instant::now();
    slow_runtime.stop().await;
    let stop_elapsed = stop_start.elapsed();
    println!("stop() returned after {stop_elapsed:?} with a 2s listener delay in flight");
    assert!(
        stop_elapsed < Duration::from_secs(1),
        "stop() should not block on the in-flight delay, took {stop_elapsed:?}"
    );

    let follow_up = slow_bus.pop("target-queue").await.unwrap();
    assert!(
        follow_up.is_some(),
        "the listener's emit action must still run after its delay is cut short, not be abandoned"
    );
    println!("post-delay emit action completed despite cancellation: {follow_up:?}");

    println!("\nall checks passed");
}
