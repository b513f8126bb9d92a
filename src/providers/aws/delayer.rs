//! Delayed delivery composed from SQS and the relay function.
//!
//! # Responsibilities
//! - Publish one relay message per task, with the queue's native
//!   per-message delay
//! - Provision the role/function/queue wiring once
//!
//! # Design Decisions
//! - Fire-and-forget: no creation timeout; only publish failures surface
//! - The service caps per-message delay at 15 minutes; the bound is
//!   enforced here, before the network call

use async_trait::async_trait;
use tokio::sync::OnceCell;

use crate::config::AwsConfig;
use crate::error::{TaskError, TaskResult};
use crate::providers::aws::client::AwsApiClient;
use crate::providers::aws::provision::{provision_delay_resources, DelayResources};
use crate::providers::{DeferredTask, DelayedTaskProvider, TaskHandle};
use crate::relay::RelayPayload;

/// SQS rejects DelaySeconds above 15 minutes.
const MAX_DELAY_SECONDS: i64 = 900;

/// [`DelayedTaskProvider`] composed from a plain message queue and the
/// relay function.
pub struct SqsDelayer {
    client: AwsApiClient,
    queue_name: String,
    function_name: String,
    role_name: String,
    runtime: String,
    resources: OnceCell<DelayResources>,
}

impl SqsDelayer {
    pub fn new(client: AwsApiClient, config: &AwsConfig) -> Self {
        Self {
            client,
            queue_name: config.queue_name.clone(),
            function_name: config.relay_function_name.clone(),
            role_name: config.relay_role_name.clone(),
            runtime: config.relay_runtime.clone(),
            resources: OnceCell::new(),
        }
    }

    /// Provisioned handles, created on first use and cached for the life
    /// of the provider.
    async fn resources(&self) -> TaskResult<&DelayResources> {
        self.resources
            .get_or_try_init(|| {
                provision_delay_resources(
                    &self.client,
                    &self.role_name,
                    &self.function_name,
                    &self.queue_name,
                    &self.runtime,
                )
            })
            .await
    }
}

#[async_trait]
impl DelayedTaskProvider for SqsDelayer {
    async fn provision(&self) -> TaskResult<()> {
        self.resources().await?;
        Ok(())
    }

    async fn enqueue_delayed(&self, task: DeferredTask) -> TaskResult<TaskHandle> {
        task.validate()?;
        if self.queue_name.is_empty() {
            return Err(TaskError::validation("queue_name", "must not be empty"));
        }
        if task.delay_seconds > MAX_DELAY_SECONDS {
            return Err(TaskError::validation(
                "delay_seconds",
                format!("queue delay is capped at {MAX_DELAY_SECONDS} seconds"),
            ));
        }

        let payload = RelayPayload::new(
            task.endpoint_url.clone(),
            &task.http_method,
            task.headers.clone(),
            task.body.clone(),
        )?;
        let message_body = serde_json::to_string(&payload)
            .map_err(|e| TaskError::validation("body", e.to_string()))?;

        let resources = self.resources().await?;
        let sent = self
            .client
            .send_message(&resources.queue_url, message_body, Some(task.delay_seconds))
            .await
            .map_err(|error| {
                tracing::error!(
                    endpoint_url = %task.endpoint_url,
                    queue_url = %resources.queue_url,
                    error = %error,
                    "failed to publish delayed message"
                );
                error
            })?;

        tracing::info!(
            message_id = %sent.message_id,
            delay_seconds = task.delay_seconds,
            "delayed message published"
        );
        Ok(TaskHandle {
            name: sent.message_id,
        })
    }
}
