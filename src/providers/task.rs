//! Task and job descriptions handed to provider clients.
//!
//! # Responsibilities
//! - Describe a single future HTTP call ([`DeferredTask`])
//! - Describe a named recurring invocation ([`ScheduleJob`])
//! - Validate inputs before any network call is attempted
//!
//! # Design Decisions
//! - Validation failures never reach a backend; providers call `validate()`
//!   first and return [`TaskError::Validation`] immediately
//! - One task is exactly one HTTP call: single URL, single method
//! - Retry policy mirrors the scheduler backend's native knobs; no uniform
//!   retry abstraction on top

use std::collections::HashMap;

use axum::http::Method;
use url::Url;
use uuid::Uuid;

use crate::error::{TaskError, TaskResult};

/// Methods the delivery backends can replay.
static SUPPORTED_METHODS: [Method; 7] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::PATCH,
    Method::HEAD,
    Method::OPTIONS,
];

/// Map a method to its canonical wire name, rejecting anything the backends
/// cannot deliver (e.g. TRACE, CONNECT, extension methods).
pub fn supported_method(method: &Method) -> TaskResult<&'static str> {
    for candidate in &SUPPORTED_METHODS {
        if method == candidate {
            return Ok(candidate.as_str());
        }
    }
    Err(TaskError::BadMethod(method.to_string()))
}

fn validate_endpoint_url(endpoint_url: &str) -> TaskResult<()> {
    let parsed = Url::parse(endpoint_url)
        .map_err(|e| TaskError::validation("endpoint_url", e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(TaskError::validation(
            "endpoint_url",
            format!("unsupported scheme '{other}'"),
        )),
    }
}

/// A single future HTTP call.
#[derive(Debug, Clone)]
pub struct DeferredTask {
    /// Absolute callback URL.
    pub endpoint_url: String,

    /// Method the backend will use when replaying the call.
    pub http_method: Method,

    /// Headers forwarded verbatim.
    pub headers: HashMap<String, String>,

    /// Optional structured payload, JSON-serialized at send time.
    pub body: Option<serde_json::Value>,

    /// Seconds to wait before the call fires. Zero means "as soon as
    /// possible". Signed so that negative input is representable and
    /// rejected here rather than by the backend.
    pub delay_seconds: i64,

    /// Bounds the backend call that *creates* the task, not the eventual
    /// HTTP call.
    pub timeout_seconds: f64,
}

impl DeferredTask {
    /// Check every field the providers rely on. Runs before any network
    /// call; a violation means the backend was never contacted.
    pub fn validate(&self) -> TaskResult<()> {
        validate_endpoint_url(&self.endpoint_url)?;
        supported_method(&self.http_method)?;
        if self.delay_seconds < 0 {
            return Err(TaskError::validation("delay_seconds", "must be >= 0"));
        }
        if !(self.timeout_seconds > 0.0) {
            return Err(TaskError::validation("timeout_seconds", "must be > 0"));
        }
        Ok(())
    }
}

/// Retry policy for schedule jobs, expressed in the scheduler backend's
/// native terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRetryConfig {
    pub retry_count: u32,
    /// Zero means unbounded by time (bounded by count only).
    pub max_retry_seconds: u64,
    pub min_backoff_seconds: u64,
    pub max_backoff_seconds: u64,
    pub max_doublings: u32,
}

impl Default for JobRetryConfig {
    fn default() -> Self {
        Self {
            retry_count: 3,
            max_retry_seconds: 0,
            min_backoff_seconds: 5,
            max_backoff_seconds: 60,
            max_doublings: 5,
        }
    }
}

/// A named, cron-driven recurring invocation.
///
/// Lifecycle: absent → created → updated* → deleted. Creation against an
/// existing name converts to an update (upsert), never an error.
#[derive(Debug, Clone)]
pub struct ScheduleJob {
    /// Unique within the backend's location/namespace. Generated when empty.
    pub name: String,

    /// Cron-family expression, backend-native syntax, passed through
    /// uninterpreted.
    pub schedule: String,

    /// Absolute callback URL. Filled in by the bound endpoint.
    pub endpoint_url: String,

    /// Method used at trigger time. Filled in by the bound endpoint.
    pub http_method: Method,

    pub headers: HashMap<String, String>,

    pub body: Option<serde_json::Value>,

    /// Backend retry policy; the scheduler default applies when `None`.
    pub retry_config: Option<JobRetryConfig>,

    pub time_zone: String,
}

impl ScheduleJob {
    /// A job with the given cron expression and defaults everywhere else.
    /// URL and method are injected by the endpoint it is scheduled through.
    pub fn new(schedule: impl Into<String>) -> Self {
        Self {
            name: String::new(),
            schedule: schedule.into(),
            endpoint_url: String::new(),
            http_method: Method::POST,
            headers: HashMap::new(),
            body: None,
            retry_config: None,
            time_zone: "UTC".to_string(),
        }
    }

    pub fn named(name: impl Into<String>, schedule: impl Into<String>) -> Self {
        let mut job = Self::new(schedule);
        job.name = name.into();
        job
    }

    /// The job name, generating a unique one when the caller left it empty.
    pub fn resolved_name(&self) -> String {
        if self.name.is_empty() {
            format!("axum-cloud-tasks-job-{}", Uuid::new_v4())
        } else {
            self.name.clone()
        }
    }

    pub fn validate(&self) -> TaskResult<()> {
        validate_endpoint_url(&self.endpoint_url)?;
        supported_method(&self.http_method)?;
        if self.schedule.is_empty() {
            return Err(TaskError::validation("schedule", "must not be empty"));
        }
        if self.time_zone.is_empty() {
            return Err(TaskError::validation("time_zone", "must not be empty"));
        }
        Ok(())
    }
}

/// Partial update of an existing schedule job.
///
/// Only fields named in the effective mask are replaced server-side; the
/// mask defaults to the schedule expression plus every optional field the
/// caller actually set.
#[derive(Debug, Clone)]
pub struct ScheduleJobUpdate {
    pub name: String,

    /// New cron expression; always part of the update.
    pub schedule: String,

    pub headers: Option<HashMap<String, String>>,

    pub body: Option<serde_json::Value>,

    pub retry_config: Option<JobRetryConfig>,

    pub time_zone: Option<String>,

    /// Explicit mask override. `None` means "schedule plus whatever is set".
    pub update_mask: Option<Vec<String>>,

    /// Bound callback URL, injected by the endpoint. Used when the mask
    /// touches the HTTP target.
    pub endpoint_url: String,

    /// Bound method, injected by the endpoint.
    pub http_method: Method,
}

impl ScheduleJobUpdate {
    pub fn new(name: impl Into<String>, schedule: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schedule: schedule.into(),
            headers: None,
            body: None,
            retry_config: None,
            time_zone: None,
            update_mask: None,
            endpoint_url: String::new(),
            http_method: Method::POST,
        }
    }

    /// The field names this update replaces.
    pub fn effective_mask(&self) -> Vec<String> {
        if let Some(mask) = &self.update_mask {
            return mask.clone();
        }
        let mut mask = vec!["schedule".to_string()];
        if self.headers.is_some() {
            mask.push("headers".to_string());
        }
        if self.body.is_some() {
            mask.push("body".to_string());
        }
        if self.retry_config.is_some() {
            mask.push("retry_config".to_string());
        }
        if self.time_zone.is_some() {
            mask.push("time_zone".to_string());
        }
        mask
    }

    pub fn validate(&self) -> TaskResult<()> {
        if self.name.is_empty() {
            return Err(TaskError::validation("name", "must not be empty"));
        }
        if self.schedule.is_empty() {
            return Err(TaskError::validation("schedule", "must not be empty"));
        }
        Ok(())
    }
}

/// Opaque identifier of an enqueued delayed task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskHandle {
    pub name: String,
}

/// Opaque identifier of a created or updated schedule job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_task() -> DeferredTask {
        DeferredTask {
            endpoint_url: "https://svc.example.com/x".to_string(),
            http_method: Method::POST,
            headers: HashMap::new(),
            body: Some(json!({"a": 1})),
            delay_seconds: 0,
            timeout_seconds: 10.0,
        }
    }

    #[test]
    fn valid_task_passes() {
        assert!(valid_task().validate().is_ok());
    }

    #[test]
    fn negative_delay_rejected() {
        let mut task = valid_task();
        task.delay_seconds = -1;
        assert!(matches!(
            task.validate(),
            Err(TaskError::Validation { field: "delay_seconds", .. })
        ));
    }

    #[test]
    fn non_positive_timeout_rejected() {
        let mut task = valid_task();
        task.timeout_seconds = 0.0;
        assert!(matches!(
            task.validate(),
            Err(TaskError::Validation { field: "timeout_seconds", .. })
        ));
        task.timeout_seconds = f64::NAN;
        assert!(task.validate().is_err());
    }

    #[test]
    fn relative_url_rejected() {
        let mut task = valid_task();
        task.endpoint_url = "/no-scheme".to_string();
        assert!(matches!(
            task.validate(),
            Err(TaskError::Validation { field: "endpoint_url", .. })
        ));
    }

    #[test]
    fn non_http_scheme_rejected() {
        let mut task = valid_task();
        task.endpoint_url = "ftp://svc/x".to_string();
        assert!(task.validate().is_err());
    }

    #[test]
    fn trace_method_rejected() {
        let method = Method::from_bytes(b"TRACE").unwrap();
        assert!(matches!(
            supported_method(&method),
            Err(TaskError::BadMethod(m)) if m == "TRACE"
        ));
    }

    #[test]
    fn job_name_generated_when_empty() {
        let job = ScheduleJob::new("*/5 * * * *");
        let name = job.resolved_name();
        assert!(name.starts_with("axum-cloud-tasks-job-"));
        // A second resolution generates a fresh name; named jobs are stable.
        assert_ne!(name, job.resolved_name());
        let named = ScheduleJob::named("reconcile", "*/5 * * * *");
        assert_eq!(named.resolved_name(), "reconcile");
    }

    #[test]
    fn update_mask_defaults_to_schedule_plus_set_fields() {
        let mut update = ScheduleJobUpdate::new("reconcile", "0 8 * * *");
        assert_eq!(update.effective_mask(), vec!["schedule"]);

        update.headers = Some(HashMap::new());
        update.time_zone = Some("Europe/Berlin".to_string());
        assert_eq!(
            update.effective_mask(),
            vec!["schedule", "headers", "time_zone"]
        );
    }

    #[test]
    fn explicit_mask_wins() {
        let mut update = ScheduleJobUpdate::new("reconcile", "0 8 * * *");
        update.body = Some(json!({}));
        update.update_mask = Some(vec!["schedule".to_string()]);
        assert_eq!(update.effective_mask(), vec!["schedule"]);
    }
}
