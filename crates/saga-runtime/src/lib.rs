//! The scenario runtime: worker loop, dispatch, and per-correlation state.

pub mod config;
pub mod dispatch;
pub mod processed;
pub mod runtime;
pub mod state;
pub mod worker;

pub use config::ScenarioRuntimeConfig;
pub use dispatch::{DispatchError, Dispatcher};
pub use processed::ProcessedIdSet;
pub use runtime::ScenarioRuntime;
pub use state::{StateMap, StateSnapshot};
pub use worker::Worker;
