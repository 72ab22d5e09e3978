//! HTTP client for a remote bus broker, per the wire protocol in the
//! envelope/bus specification:
//!
//! - `POST /queues/{name}/messages` — push; `202 {status:"enqueued"}` on
//!   success, `400 {error}` on invalid envelope.
//! - `POST /queues/{name}:pop` — pop; `200 {status:"empty"}` or
//!   `200 {message: <envelope>}`. Non-2xx is a transport error.
//!
//! Queue names are percent-encoded in the path.

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::Deserialize;

use crate::bus::{BusError, EventBus};
use crate::envelope::{EnvelopeError, EventEnvelope};

/// Client for a remote broker implementing the bus protocol over HTTP.
#[derive(Debug, Clone)]
pub struct RemoteEventBusClient {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct PopResponse {
    status: Option<String>,
    message: Option<EventEnvelope>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    error: String,
}

impl RemoteEventBusClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn queue_path(&self, queue: &str, suffix: &str) -> String {
        let encoded = utf8_percent_encode(queue, NON_ALPHANUMERIC);
        format!("{}/queues/{}{}", self.base_url, encoded, suffix)
    }
}

#[async_trait]
impl EventBus for RemoteEventBusClient {
    async fn push(&self, queue: &str, envelope: EventEnvelope) -> Result<(), BusError> {
        envelope.validate()?;

        let response = self
            .client
            .post(self.queue_path(queue, "/messages"))
            .json(&envelope)
            .send()
            .await
            .map_err(|e| BusError::Transport(e.to_string()))?;

        if response.status() == reqwest::StatusCode::BAD_REQUEST {
            let body: ErrorResponse = response
                .json()
                .await
                .unwrap_or_else(|_| ErrorResponse { error: "invalid envelope".into() });
            return Err(BusError::Invalid(EnvelopeError::Invalid(body.error)));
        }

        if !response.status().is_success() {
            return Err(BusError::Transport(format!(
                "push failed with status {}",
                response.status()
            )));
        }

        Ok(())
    }

    async fn pop(&self, queue: &str) -> Result<Option<EventEnvelope>, BusError> {
        let response = self
            .client
            .post(self.queue_path(queue, ":pop"))
            .send()
            .await
            .map_err(|e| BusError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BusError::Transport(format!(
                "pop failed with status {}",
                response.status()
            )));
        }

        let body: PopResponse = response
            .json()
            .await
            .map_err(|e| BusError::Transport(e.to_string()))?;

        match body.message {
            Some(envelope) => {
                envelope.validate()?;
                Ok(Some(envelope))
            }
            None => {
                if body.status.as_deref() == Some("empty") || body.status.is_none() {
                    Ok(None)
                } else {
                    Err(BusError::Transport(format!(
                        "unexpected pop response status {:?}",
                        body.status
                    )))
                }
            }
        }
    }
}
