//! Recurring delivery composed from EventBridge rules and the relay.
//!
//! # Responsibilities
//! - Create-or-update a time-based rule per job and attach the relay
//!   function with the job's payload as rule input
//!
//! # Design Decisions
//! - PutRule/PutTargets are themselves upserts, so a second `schedule`
//!   with the same name replaces the expression and payload in place
//! - Update and delete are not implemented by this backend; both return an
//!   explicit unsupported error rather than silently doing nothing

use async_trait::async_trait;
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::config::AwsConfig;
use crate::error::{TaskError, TaskResult};
use crate::providers::aws::api::RuleTarget;
use crate::providers::aws::client::AwsApiClient;
use crate::providers::aws::provision::{provision_schedule_resources, ScheduleResources};
use crate::providers::{JobHandle, ScheduleJob, ScheduleJobUpdate, ScheduleProvider};
use crate::relay::RelayPayload;

/// [`ScheduleProvider`] composed from event rules and the relay function.
pub struct EventBridgeScheduler {
    client: AwsApiClient,
    scheduler_role_name: String,
    relay_role_name: String,
    function_name: String,
    runtime: String,
    resources: OnceCell<ScheduleResources>,
}

impl EventBridgeScheduler {
    pub fn new(client: AwsApiClient, config: &AwsConfig) -> Self {
        Self {
            client,
            scheduler_role_name: config.scheduler_role_name.clone(),
            relay_role_name: config.relay_role_name.clone(),
            function_name: config.relay_function_name.clone(),
            runtime: config.relay_runtime.clone(),
            resources: OnceCell::new(),
        }
    }

    async fn resources(&self) -> TaskResult<&ScheduleResources> {
        self.resources
            .get_or_try_init(|| {
                provision_schedule_resources(
                    &self.client,
                    &self.scheduler_role_name,
                    &self.relay_role_name,
                    &self.function_name,
                    &self.runtime,
                )
            })
            .await
    }
}

#[async_trait]
impl ScheduleProvider for EventBridgeScheduler {
    async fn provision(&self) -> TaskResult<()> {
        self.resources().await?;
        Ok(())
    }

    async fn upsert_job(&self, job: ScheduleJob) -> TaskResult<JobHandle> {
        job.validate()?;

        let name = job.resolved_name();
        let payload = RelayPayload::new(
            job.endpoint_url.clone(),
            &job.http_method,
            job.headers.clone(),
            job.body.clone(),
        )?;
        let input = serde_json::to_string(&payload)
            .map_err(|e| TaskError::validation("body", e.to_string()))?;

        let resources = self.resources().await?;
        let rule_arn = self
            .client
            .put_rule(&name, &job.schedule)
            .await
            .map_err(|error| {
                tracing::error!(rule = %name, error = %error, "failed to put schedule rule");
                error
            })?;

        let target = RuleTarget {
            id: format!("relay-target-{}", Uuid::new_v4()),
            arn: resources.function_arn.clone(),
            input,
        };
        self.client
            .put_targets(&name, vec![target])
            .await
            .map_err(|error| {
                tracing::error!(rule = %name, error = %error, "failed to attach relay target");
                error
            })?;

        tracing::info!(rule = %name, rule_arn = %rule_arn, schedule = %job.schedule, "schedule rule in place");
        Ok(JobHandle { name })
    }

    async fn update_job(&self, _update: ScheduleJobUpdate) -> TaskResult<JobHandle> {
        Err(TaskError::Unsupported {
            backend: "aws",
            operation: "update_schedule",
        })
    }

    async fn delete_job(&self, _name: &str) -> TaskResult<()> {
        Err(TaskError::Unsupported {
            backend: "aws",
            operation: "delete_schedule",
        })
    }
}
