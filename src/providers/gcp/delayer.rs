//! Delayed delivery via Cloud Tasks.
//!
//! # Responsibilities
//! - Validate the task, then submit it with an absolute trigger timestamp
//! - Fetch-or-create the target queue once per process
//!
//! # Design Decisions
//! - Best-effort enqueue: backend failures are wrapped, logged, and
//!   re-raised; there is no local retry
//! - Trigger time is computed here (now + delay), not by the backend

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::OnceCell;

use crate::config::GcpConfig;
use crate::error::{TaskError, TaskResult};
use crate::providers::gcp::api::{self, HttpRequest, Task};
use crate::providers::gcp::client::GcpApiClient;
use crate::providers::task::supported_method;
use crate::providers::{DeferredTask, DelayedTaskProvider, TaskHandle};

/// [`DelayedTaskProvider`] backed by Cloud Tasks' native delayed delivery.
pub struct GcpDelayer {
    client: GcpApiClient,
    queue_path: String,
    auto_create_queue: bool,
    queue_ready: OnceCell<()>,
}

impl GcpDelayer {
    pub fn new(client: GcpApiClient, config: &GcpConfig) -> Self {
        Self {
            client,
            queue_path: config.queue_path.clone(),
            auto_create_queue: config.auto_create_queue,
            queue_ready: OnceCell::new(),
        }
    }

    /// Fetch-or-create the queue. Idempotent: creation relies on the
    /// backend's own existence check.
    async fn ensure_queue(&self) -> TaskResult<()> {
        if !self.auto_create_queue {
            return Ok(());
        }
        match self.client.get_queue(&self.queue_path).await? {
            Some(queue) => {
                tracing::debug!(queue = %queue.name, "queue exists");
            }
            None => {
                let created = self.client.create_queue(&self.queue_path).await?;
                tracing::info!(queue = %created.name, "queue created");
            }
        }
        Ok(())
    }
}

/// Absolute trigger timestamp: now (UTC) plus the delay, or now when the
/// delay is zero.
fn schedule_time(now: DateTime<Utc>, delay_seconds: i64) -> DateTime<Utc> {
    if delay_seconds <= 0 {
        now
    } else {
        now + TimeDelta::seconds(delay_seconds)
    }
}

#[async_trait]
impl DelayedTaskProvider for GcpDelayer {
    async fn provision(&self) -> TaskResult<()> {
        self.queue_ready
            .get_or_try_init(|| self.ensure_queue())
            .await?;
        Ok(())
    }

    async fn enqueue_delayed(&self, task: DeferredTask) -> TaskResult<TaskHandle> {
        task.validate()?;
        if self.queue_path.is_empty() {
            return Err(TaskError::validation("queue_path", "must not be empty"));
        }
        let http_method = supported_method(&task.http_method)?;

        let wire_task = Task {
            name: None,
            http_request: HttpRequest {
                url: task.endpoint_url.clone(),
                http_method: http_method.to_string(),
                headers: task.headers.clone(),
                body: task.body.as_ref().map(api::encode_body),
            },
            schedule_time: Some(api::timestamp(schedule_time(
                Utc::now(),
                task.delay_seconds,
            ))),
        };

        let timeout = Duration::from_secs_f64(task.timeout_seconds);
        let created = self
            .client
            .create_task(&self.queue_path, wire_task, timeout)
            .await
            .map_err(|error| {
                tracing::error!(
                    endpoint_url = %task.endpoint_url,
                    queue = %self.queue_path,
                    error = %error,
                    "failed to enqueue delayed task"
                );
                error
            })?;

        let name = created.name.unwrap_or_default();
        tracing::info!(task = %name, delay_seconds = task.delay_seconds, "delayed task enqueued");
        Ok(TaskHandle { name })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_delay_fires_now() {
        let now = Utc::now();
        assert_eq!(schedule_time(now, 0), now);
    }

    #[test]
    fn positive_delay_added_to_now() {
        let now = Utc::now();
        let at = schedule_time(now, 90);
        assert_eq!((at - now).num_seconds(), 90);
    }
}
