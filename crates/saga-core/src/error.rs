//! Shared error taxonomy.
//!
//! Per-crate error types (`EnvelopeError`, `BusError`, `ScenarioError`, ...)
//! live next to the code that produces them and convert into `SagaError` at
//! the boundaries that need a single error type (mainly tests and the
//! runtime's top-level `Result`s). Keep this enum focused on the taxonomy
//! from the error handling design: validation / transport / dispatch /
//! timeout / configuration.

use thiserror::Error;

pub type SagaResult<T> = Result<T, SagaError>;

/// Top-level error taxonomy for the saga engine.
///
/// Validation and configuration errors are never retried; transport errors
/// are retried by `publish_with_retry`; dispatch errors are logged and
/// swallowed by the runtime (the saga keeps moving).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SagaError {
    /// An identifier failed to parse.
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// An envelope or scenario document failed strict validation.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A bus push/pop failed for transport reasons (network, broker error).
    #[error("transport error: {0}")]
    Transport(String),

    /// An operation exceeded its deadline.
    #[error("timed out after {0}ms")]
    Timeout(u64),

    /// A listener action failed while executing (logged, not fatal).
    #[error("dispatch error: {0}")]
    Dispatch(String),

    /// Fatal configuration error (missing scenario, duplicate identifiers).
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl SagaError {
    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Whether `publish_with_retry` should retry this error.
    ///
    /// Only transport failures are retriable; validation errors are caller
    /// bugs and configuration errors are fatal at startup.
    pub fn is_retriable(&self) -> bool {
        matches!(self, SagaError::Transport(_))
    }
}
