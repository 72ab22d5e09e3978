//! The scenario DSL: domains, typed events, and listeners.
//!
//! Mirrors the JSON/YAML document shape exactly (see `normalize` for the
//! validation pass that turns a raw `serde_json::Value` into one of these).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A declarative saga scenario: domains, event schemas, and listeners.
///
/// Immutable after load; `normalize::normalize_scenario` is the only
/// constructor outside of tests, so every `Scenario` in circulation has
/// already passed strict validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: u64,
    pub domains: Vec<Domain>,
    pub events: Vec<EventDef>,
    pub listeners: Vec<Listener>,
}

fn default_version() -> u64 {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Domain {
    pub id: String,
    pub queue: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EventDef {
    pub name: String,
    pub payload_schema: PayloadSchema,
}

/// The declared shape of an event's `data` field.
///
/// Recursive: a primitive marker, a nested object schema, or a
/// single-element array denoting an array-of-object field. `Object` uses
/// an `IndexMap` so field order in the document is preserved — the mapping
/// engine walks destination schemas in this order, and §4.6's determinism
/// guarantee depends on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PayloadSchema {
    Primitive(PrimitiveType),
    Object(IndexMap<String, PayloadSchema>),
    Array(Vec<PayloadSchema>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    String,
    Number,
    Boolean,
    Datetime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Listener {
    pub id: String,
    pub on: OnEvent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay_ms: Option<u64>,
    pub actions: Vec<ListenerAction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OnEvent {
    pub event: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ListenerAction {
    SetState {
        domain: String,
        status: String,
    },
    Emit {
        event: String,
        #[serde(rename = "toDomain")]
        to_domain: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mapping: Option<EmitMapping>,
        #[serde(default, skip_serializing_if = "Option::is_none", rename = "delayMs")]
        delay_ms: Option<u64>,
    },
}

/// A declarative projection from a source payload onto a destination
/// payload shape, parallel to `PayloadSchema`.
///
/// Variant order matters: this is `#[serde(untagged)]`, so serde tries each
/// variant in declaration order and keeps the first that parses. `ObjectFrom`
/// and `ArrayFrom` (which require their named keys) are tried before the
/// catch-all `Map`, so an explicit `{object_from, map}`/`{array_from, map}`
/// document is never mistaken for a bare nested mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EmitMapping {
    /// A bare source field name: copy `source[name]` if present and
    /// type-compatible.
    Field(String),
    From {
        from: String,
    },
    Const {
        #[serde(rename = "const")]
        value: Value,
    },
    ObjectFrom {
        #[serde(rename = "objectFrom")]
        object_from: String,
        map: IndexMap<String, EmitMapping>,
    },
    ArrayFrom {
        #[serde(rename = "arrayFrom")]
        array_from: String,
        map: IndexMap<String, EmitMapping>,
    },
    /// A bare nested mapping object: descends into the same sub-source in
    /// place, with no `object_from`/`map` wrapper.
    Map(IndexMap<String, EmitMapping>),
}
