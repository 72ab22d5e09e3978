//! Strict validation and normalization of the scenario DSL (C5).

use std::collections::{HashMap, HashSet};

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::types::{ListenerAction, PayloadSchema, Scenario};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScenarioError {
    /// The document didn't even match the scenario shape (unknown keys,
    /// wrong types, ...).
    #[error("malformed scenario document: {0}")]
    Malformed(String),

    /// The document parsed, but failed cross-reference or uniqueness
    /// validation. Lists every issue found, each with a dotted path.
    #[error("invalid scenario: {}", issues.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
    Invalid { issues: Vec<ValidationIssue> },
}

/// Parse an arbitrary JSON value into a validated `Scenario`.
///
/// Applies defaults (`version = 1` if missing), rejects unknown keys
/// (enforced by `#[serde(deny_unknown_fields)]` on the DSL types), and
/// rejects duplicate domain ids, duplicate queue names, duplicate event
/// names, and listeners whose `on.event`, emitted `event`, or `to_domain`
/// references a name that isn't declared. All reference issues are
/// aggregated into a single `Invalid` error with dotted paths.
pub fn normalize_scenario(raw: Value) -> Result<Scenario, ScenarioError> {
    let scenario: Scenario = serde_json::from_value(raw).map_err(|e| {
        warn!(error = %e, "scenario document failed to parse");
        ScenarioError::Malformed(e.to_string())
    })?;

    let issues = validate_references(&scenario);
    if issues.is_empty() {
        debug!(
            scenario = %scenario.name,
            domains = scenario.domains.len(),
            events = scenario.events.len(),
            listeners = scenario.listeners.len(),
            "scenario passed validation"
        );
        Ok(scenario)
    } else {
        warn!(
            scenario = %scenario.name,
            issue_count = issues.len(),
            "scenario failed cross-reference validation"
        );
        Err(ScenarioError::Invalid { issues })
    }
}

fn validate_references(scenario: &Scenario) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    let mut domain_ids: HashMap<&str, usize> = HashMap::new();
    let mut queues: HashMap<&str, usize> = HashMap::new();
    for (i, domain) in scenario.domains.iter().enumerate() {
        if let Some(first) = domain_ids.insert(domain.id.as_str(), i) {
            issues.push(ValidationIssue {
                path: format!("domains[{i}].id"),
                message: format!("duplicate domain id '{}' (first declared at domains[{first}])", domain.id),
            });
        }
        if let Some(first) = queues.insert(domain.queue.as_str(), i) {
            issues.push(ValidationIssue {
                path: format!("domains[{i}].queue"),
                message: format!(
                    "duplicate queue name '{}' (first declared at domains[{first}])",
                    domain.queue
                ),
            });
        }
    }
    let known_domains: HashSet<&str> = domain_ids.keys().copied().collect();

    let mut event_names: HashMap<&str, usize> = HashMap::new();
    for (i, event) in scenario.events.iter().enumerate() {
        if let Some(first) = event_names.insert(event.name.as_str(), i) {
            issues.push(ValidationIssue {
                path: format!("events[{i}].name"),
                message: format!(
                    "duplicate event name '{}' (first declared at events[{first}])",
                    event.name
                ),
            });
        }
        check_array_arity(
            &event.payload_schema,
            &format!("events[{i}].payloadSchema"),
            &mut issues,
        );
    }
    let known_events: HashSet<&str> = event_names.keys().copied().collect();

    if scenario.listeners.is_empty() {
        issues.push(ValidationIssue {
            path: "listeners".to_string(),
            message: "scenario must declare at least one listener".to_string(),
        });
    }

    for (li, listener) in scenario.listeners.iter().enumerate() {
        if !known_events.contains(listener.on.event.as_str()) {
            issues.push(ValidationIssue {
                path: format!("listeners[{li}].on.event"),
                message: format!("references undeclared event '{}'", listener.on.event),
            });
        }

        for (ai, action) in listener.actions.iter().enumerate() {
            match action {
                ListenerAction::SetState { domain, .. } => {
                    if !known_domains.contains(domain.as_str()) {
                        issues.push(ValidationIssue {
                            path: format!("listeners[{li}].actions[{ai}].domain"),
                            message: format!("references undeclared domain '{domain}'"),
                        });
                    }
                }
                ListenerAction::Emit { event, to_domain, .. } => {
                    if !known_events.contains(event.as_str()) {
                        issues.push(ValidationIssue {
                            path: format!("listeners[{li}].actions[{ai}].event"),
                            message: format!("references undeclared event '{event}'"),
                        });
                    }
                    if !known_domains.contains(to_domain.as_str()) {
                        issues.push(ValidationIssue {
                            path: format!("listeners[{li}].actions[{ai}].to_domain"),
                            message: format!("references undeclared domain '{to_domain}'"),
                        });
                    }
                }
            }
        }
    }

    issues
}

/// Recursively checks that every `PayloadSchema::Array` in the tree declares
/// exactly one item schema. The mapping engine (`apply_emit_mapping`) only
/// ever reads the first declared item schema for an array field; zero items
/// leaves it with nothing to project against, and two or more silently
/// discard every schema after the first with no warning at mapping time.
fn check_array_arity(schema: &PayloadSchema, path: &str, issues: &mut Vec<ValidationIssue>) {
    match schema {
        PayloadSchema::Primitive(_) => {}
        PayloadSchema::Object(fields) => {
            for (name, field_schema) in fields {
                check_array_arity(field_schema, &format!("{path}.{name}"), issues);
            }
        }
        PayloadSchema::Array(item_schemas) => {
            if item_schemas.len() != 1 {
                issues.push(ValidationIssue {
                    path: path.to_string(),
                    message: format!(
                        "array schema must declare exactly one item schema, found {}",
                        item_schemas.len()
                    ),
                });
            }
            for (i, item_schema) in item_schemas.iter().enumerate() {
                check_array_arity(item_schema, &format!("{path}[{i}]"), issues);
            }
        }
    }
}
