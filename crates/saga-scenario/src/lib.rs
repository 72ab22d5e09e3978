//! The declarative scenario DSL: domains, typed events, listeners, and the
//! strict validation pass that turns a raw document into a usable `Scenario`.

pub mod loader;
pub mod normalize;
pub mod types;

pub use loader::{bundled_dir, load_scenario, LoadError};
pub use normalize::{normalize_scenario, ScenarioError, ValidationIssue};
pub use types::{
    Domain, EmitMapping, EventDef, Listener, ListenerAction, OnEvent, PayloadSchema,
    PrimitiveType, Scenario,
};
