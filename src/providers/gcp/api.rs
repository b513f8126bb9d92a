//! Cloud Tasks and Cloud Scheduler REST wire types.

use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// HTTP request carried by a Cloud Tasks task.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpRequest {
    pub url: String,
    pub http_method: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
    /// Base64-encoded request body bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

/// A Cloud Tasks task.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub http_request: HttpRequest,
    /// RFC 3339 trigger timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule_time: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub task: Task,
}

/// A Cloud Tasks queue. Only the name matters here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Queue {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

/// HTTP target of a Cloud Scheduler job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpTarget {
    pub uri: String,
    pub http_method: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

/// Scheduler retry policy, durations in proto JSON string form ("5s").
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryConfig {
    pub retry_count: u32,
    pub max_retry_duration: String,
    pub min_backoff_duration: String,
    pub max_backoff_duration: String,
    pub max_doublings: u32,
}

impl From<&crate::providers::task::JobRetryConfig> for RetryConfig {
    fn from(config: &crate::providers::task::JobRetryConfig) -> Self {
        Self {
            retry_count: config.retry_count,
            max_retry_duration: duration(config.max_retry_seconds),
            min_backoff_duration: duration(config.min_backoff_seconds),
            max_backoff_duration: duration(config.max_backoff_seconds),
            max_doublings: config.max_doublings,
        }
    }
}

/// A Cloud Scheduler job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_target: Option<HttpTarget>,
    pub schedule: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_config: Option<RetryConfig>,
}

/// Google API error envelope.
#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: String,
}

/// Proto Duration JSON form.
pub fn duration(seconds: u64) -> String {
    format!("{seconds}s")
}

/// Proto Timestamp JSON form.
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// JSON-serialize and base64-encode a structured body for the wire.
pub fn encode_body(body: &serde_json::Value) -> String {
    BASE64.encode(serde_json::to_vec(body).unwrap_or_default())
}
