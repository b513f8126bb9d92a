//! Relay message contract and native delivery.
//!
//! # Responsibilities
//! - Define the queued-message payload shared by the delay and schedule
//!   paths of the queue-plus-relay backend
//! - Replay one decoded message as exactly one outbound HTTP request
//!
//! # Design Decisions
//! - One message, one request; the response status is logged, never fed
//!   back into the queue
//! - The payload shape is the wire contract: the packaged Lambda artifact
//!   under `providers/aws/resources/` consumes the identical JSON

use std::collections::HashMap;

use axum::http::Method;
use serde::{Deserialize, Serialize};

use crate::error::{TaskError, TaskResult};
use crate::providers::task::supported_method;

/// The queued message: everything needed to replay one HTTP call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayPayload {
    pub endpoint_url: String,
    pub http_method: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default = "empty_object")]
    pub body: serde_json::Value,
}

fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

impl RelayPayload {
    /// Build the payload for a bound call. Absent bodies are encoded as an
    /// empty object, matching what the relay expects.
    pub fn new(
        endpoint_url: impl Into<String>,
        http_method: &Method,
        headers: HashMap<String, String>,
        body: Option<serde_json::Value>,
    ) -> TaskResult<Self> {
        let method = supported_method(http_method)?;
        Ok(Self {
            endpoint_url: endpoint_url.into(),
            http_method: method.to_string(),
            headers,
            body: body.unwrap_or_else(empty_object),
        })
    }

    /// True when there is nothing worth sending as a request body.
    pub fn body_is_empty(&self) -> bool {
        match &self.body {
            serde_json::Value::Null => true,
            serde_json::Value::Object(map) => map.is_empty(),
            _ => false,
        }
    }
}

/// Replay one payload as one HTTP request and return the response status.
///
/// Headers are merged in verbatim; the body is JSON-encoded only when
/// present and non-empty.
pub async fn deliver(client: &reqwest::Client, payload: &RelayPayload) -> TaskResult<u16> {
    let method = Method::from_bytes(payload.http_method.as_bytes())
        .map_err(|_| TaskError::BadMethod(payload.http_method.clone()))?;
    supported_method(&method)?;

    let mut request = client.request(method, payload.endpoint_url.as_str());
    for (name, value) in &payload.headers {
        request = request.header(name, value);
    }
    if !payload.body_is_empty() {
        request = request.json(&payload.body);
    }

    let response = request
        .send()
        .await
        .map_err(|e| TaskError::transport("relay", e))?;
    let status = response.status().as_u16();
    tracing::info!(
        endpoint_url = %payload.endpoint_url,
        http_method = %payload.http_method,
        status,
        "relayed queued message"
    );
    Ok(status)
}
