use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use saga_core::{CorrelationId, EventId, Payload, TraceId};

/// The wire unit exchanged between the scenario runtime and the event bus.
///
/// Every field but `causation_id` is required and non-empty; `validate()`
/// enforces this on every ingress (bus push) and egress (bus pop). Unknown
/// top-level keys are rejected at deserialization via `deny_unknown_fields`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventEnvelope {
    pub event_name: String,
    pub version: u32,
    pub event_id: EventId,
    pub trace_id: TraceId,
    pub correlation_id: CorrelationId,
    pub occurred_at: DateTime<Utc>,
    /// Present for every runtime-emitted event except the saga's initial
    /// trigger. Omitted on egress; accepted as either `null` or an absent
    /// key on ingress (spec Open Question: implementations should omit
    /// rather than emit `null`, but must accept both).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub causation_id: Option<EventId>,
    pub data: Payload,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EnvelopeError {
    #[error("invalid envelope: {0}")]
    Invalid(String),
}

impl EventEnvelope {
    /// Strict validation per the envelope contract: `version` must equal
    /// `1`, and every field but `causation_id` must be non-empty.
    pub fn validate(&self) -> Result<(), EnvelopeError> {
        if self.event_name.trim().is_empty() {
            return Err(EnvelopeError::Invalid("event_name must not be empty".into()));
        }
        if self.version != 1 {
            return Err(EnvelopeError::Invalid(format!(
                "version must be 1, got {}",
                self.version
            )));
        }
        if self.trace_id.as_str().trim().is_empty() {
            return Err(EnvelopeError::Invalid("trace_id must not be empty".into()));
        }
        if self.correlation_id.as_str().trim().is_empty() {
            return Err(EnvelopeError::Invalid(
                "correlation_id must not be empty".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use saga_core::Payload;
    use uuid::Uuid;

    fn valid_envelope() -> EventEnvelope {
        EventEnvelope {
            event_name: "OrderPlaced".to_string(),
            version: 1,
            event_id: EventId::from(Uuid::now_v7()),
            trace_id: TraceId::new("trace-1"),
            correlation_id: CorrelationId::new("order-123"),
            occurred_at: Utc::now(),
            causation_id: None,
            data: Payload::new(),
        }
    }

    #[test]
    fn rejects_wrong_version() {
        let mut env = valid_envelope();
        env.version = 2;
        assert!(env.validate().is_err());
    }

    #[test]
    fn rejects_empty_event_name() {
        let mut env = valid_envelope();
        env.event_name = String::new();
        assert!(env.validate().is_err());
    }

    #[test]
    fn accepts_valid_envelope() {
        assert!(valid_envelope().validate().is_ok());
    }

    #[test]
    fn causation_id_omitted_on_egress_accepted_as_null_on_ingress() {
        let env = valid_envelope();
        let json = serde_json::to_value(&env).unwrap();
        assert!(json.get("causation_id").is_none());

        let mut with_null = json.clone();
        with_null["causation_id"] = serde_json::Value::Null;
        let parsed: EventEnvelope = serde_json::from_value(with_null).unwrap();
        assert_eq!(parsed.causation_id, None);
    }

    #[test]
    fn rejects_unknown_top_level_keys() {
        let mut json = serde_json::to_value(valid_envelope()).unwrap();
        json["bogus"] = serde_json::json!("nope");
        let parsed: Result<EventEnvelope, _> = serde_json::from_value(json);
        assert!(parsed.is_err());
    }
}
