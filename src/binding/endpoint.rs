//! Bound-route records carrying the deferred-invocation verbs.
//!
//! # Responsibilities
//! - Hold the resolved callback URL/method and the injected provider for
//!   one route
//! - Expose `delay` / `schedule` / `update_schedule` / `delete_schedule`
//!
//! # Design Decisions
//! - Endpoints are cheap to clone (Arc-backed); any code holding one can
//!   trigger the route, which replaces the original idiom of attaching
//!   callables to the handler object
//! - `delay` is fire-and-forget: backend failures are logged and swallowed
//!   here; the schedule verbs propagate them

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::Method;

use crate::error::TaskResult;
use crate::providers::{
    DeferredTask, DelayedTaskProvider, JobHandle, ScheduleJob, ScheduleJobUpdate,
    ScheduleProvider, TaskHandle,
};

/// Caller-supplied knobs for a single `delay` call.
#[derive(Debug, Clone)]
pub struct DelayOptions {
    /// Seconds before the callback fires; zero means as soon as possible.
    pub delay_seconds: i64,

    /// Bounds the enqueue call itself.
    pub timeout_seconds: f64,

    pub headers: HashMap<String, String>,

    pub body: Option<serde_json::Value>,
}

impl Default for DelayOptions {
    fn default() -> Self {
        Self {
            delay_seconds: 0,
            timeout_seconds: 10.0,
            headers: HashMap::new(),
            body: None,
        }
    }
}

impl DelayOptions {
    pub fn after_seconds(delay_seconds: i64) -> Self {
        Self {
            delay_seconds,
            ..Self::default()
        }
    }
}

struct DelayedInner {
    endpoint_url: String,
    http_method: Method,
    provider: Arc<dyn DelayedTaskProvider>,
}

/// A bound route that can be invoked later, once.
#[derive(Clone)]
pub struct DelayedEndpoint {
    inner: Arc<DelayedInner>,
}

impl DelayedEndpoint {
    pub(crate) fn new(
        endpoint_url: String,
        http_method: Method,
        provider: Arc<dyn DelayedTaskProvider>,
    ) -> Self {
        Self {
            inner: Arc::new(DelayedInner {
                endpoint_url,
                http_method,
                provider,
            }),
        }
    }

    pub fn endpoint_url(&self) -> &str {
        &self.inner.endpoint_url
    }

    pub fn http_method(&self) -> &Method {
        &self.inner.http_method
    }

    /// Enqueue one future call to this endpoint. Returns once the enqueue
    /// attempt completes; failures are logged, never surfaced.
    pub async fn delay(&self, options: DelayOptions) {
        let task = DeferredTask {
            endpoint_url: self.inner.endpoint_url.clone(),
            http_method: self.inner.http_method.clone(),
            headers: options.headers,
            body: options.body,
            delay_seconds: options.delay_seconds,
            timeout_seconds: options.timeout_seconds,
        };
        if let Err(error) = self.try_delay(task).await {
            tracing::error!(
                endpoint_url = %self.inner.endpoint_url,
                error = %error,
                "delay attempt failed"
            );
        }
    }

    async fn try_delay(&self, task: DeferredTask) -> TaskResult<TaskHandle> {
        self.inner.provider.enqueue_delayed(task).await
    }
}

struct ScheduledInner {
    endpoint_url: String,
    http_method: Method,
    provider: Arc<dyn ScheduleProvider>,
}

/// A bound route that can be invoked on a recurring schedule.
#[derive(Clone)]
pub struct ScheduledEndpoint {
    inner: Arc<ScheduledInner>,
}

impl ScheduledEndpoint {
    pub(crate) fn new(
        endpoint_url: String,
        http_method: Method,
        provider: Arc<dyn ScheduleProvider>,
    ) -> Self {
        Self {
            inner: Arc::new(ScheduledInner {
                endpoint_url,
                http_method,
                provider,
            }),
        }
    }

    pub fn endpoint_url(&self) -> &str {
        &self.inner.endpoint_url
    }

    pub fn http_method(&self) -> &Method {
        &self.inner.http_method
    }

    /// Create or update the named job with the bound URL and method.
    pub async fn schedule(&self, mut job: ScheduleJob) -> TaskResult<JobHandle> {
        job.endpoint_url = self.inner.endpoint_url.clone();
        job.http_method = self.inner.http_method.clone();
        self.inner.provider.upsert_job(job).await
    }

    /// Partially update the named job; unnamed fields stay untouched.
    pub async fn update_schedule(&self, mut update: ScheduleJobUpdate) -> TaskResult<JobHandle> {
        update.endpoint_url = self.inner.endpoint_url.clone();
        update.http_method = self.inner.http_method.clone();
        self.inner.provider.update_job(update).await
    }

    /// Remove the named job; future firings only.
    pub async fn delete_schedule(&self, name: &str) -> TaskResult<()> {
        self.inner.provider.delete_job(name).await
    }
}
