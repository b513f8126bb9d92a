//! Recurring delivery via Cloud Scheduler.
//!
//! # Responsibilities
//! - Create-or-update cron jobs with an HTTP target (upsert)
//! - Masked partial updates
//! - Deletion by fully-qualified name
//!
//! # Design Decisions
//! - A name conflict on creation falls back to an update carrying the same
//!   fields; callers never need to know whether the name pre-existed
//! - The default update mask is the schedule plus whatever the caller set,
//!   leaving every other field untouched server-side

use std::time::Duration;

use async_trait::async_trait;

use crate::config::GcpConfig;
use crate::error::{TaskError, TaskResult};
use crate::providers::gcp::api::{self, HttpTarget, Job, RetryConfig};
use crate::providers::gcp::client::GcpApiClient;
use crate::providers::task::supported_method;
use crate::providers::{
    JobHandle, JobRetryConfig, ScheduleJob, ScheduleJobUpdate, ScheduleProvider,
};

/// Mask used when an upsert falls back to an update: replace everything the
/// create call would have set.
const FULL_MASK: &str = "schedule,timeZone,httpTarget,retryConfig";

/// [`ScheduleProvider`] backed by Cloud Scheduler's native cron jobs.
pub struct GcpScheduler {
    client: GcpApiClient,
    location_path: String,
    job_create_timeout: Duration,
}

impl GcpScheduler {
    pub fn new(client: GcpApiClient, config: &GcpConfig) -> Self {
        Self {
            client,
            location_path: config.location_path.clone(),
            job_create_timeout: Duration::from_secs_f64(config.job_create_timeout_secs),
        }
    }

    fn qualified_name(&self, name: &str) -> String {
        format!("{}/jobs/{}", self.location_path, name)
    }

    fn build_job(&self, job: &ScheduleJob, name: &str) -> TaskResult<Job> {
        let http_method = supported_method(&job.http_method)?;
        let retry = job
            .retry_config
            .clone()
            .unwrap_or_else(JobRetryConfig::default);
        Ok(Job {
            name: self.qualified_name(name),
            http_target: Some(HttpTarget {
                uri: job.endpoint_url.clone(),
                http_method: http_method.to_string(),
                headers: job.headers.clone(),
                body: job.body.as_ref().map(api::encode_body),
            }),
            schedule: job.schedule.clone(),
            time_zone: Some(job.time_zone.clone()),
            retry_config: Some(RetryConfig::from(&retry)),
        })
    }
}

/// Translate the update's logical field names into the backend's mask
/// fields. Headers and body both live under the HTTP target.
fn rest_mask(fields: &[String]) -> String {
    let mut mask: Vec<&str> = Vec::new();
    for field in fields {
        let mapped = match field.as_str() {
            "schedule" => "schedule",
            "headers" | "body" => "httpTarget",
            "retry_config" => "retryConfig",
            "time_zone" => "timeZone",
            other => {
                tracing::warn!(field = other, "unknown update field, passing through");
                other
            }
        };
        if !mask.contains(&mapped) {
            mask.push(mapped);
        }
    }
    mask.join(",")
}

#[async_trait]
impl ScheduleProvider for GcpScheduler {
    async fn upsert_job(&self, job: ScheduleJob) -> TaskResult<JobHandle> {
        job.validate()?;
        if self.location_path.is_empty() {
            return Err(TaskError::validation("location_path", "must not be empty"));
        }

        let name = job.resolved_name();
        let wire_job = self.build_job(&job, &name)?;

        match self
            .client
            .create_job(&self.location_path, &wire_job, self.job_create_timeout)
            .await
        {
            Ok(created) => {
                tracing::info!(job = %created.name, schedule = %job.schedule, "schedule job created");
                Ok(JobHandle { name: created.name })
            }
            Err(error) if error.is_already_exists() => {
                tracing::info!(job = %wire_job.name, "schedule job exists, updating in place");
                let updated = self
                    .client
                    .patch_job(&wire_job, FULL_MASK, self.job_create_timeout)
                    .await?;
                Ok(JobHandle { name: updated.name })
            }
            Err(error) => {
                tracing::error!(job = %wire_job.name, error = %error, "failed to create schedule job");
                Err(error)
            }
        }
    }

    async fn update_job(&self, update: ScheduleJobUpdate) -> TaskResult<JobHandle> {
        update.validate()?;

        let mask = rest_mask(&update.effective_mask());
        let touches_target = update.headers.is_some() || update.body.is_some();
        let http_target = if touches_target {
            let http_method = supported_method(&update.http_method)?;
            Some(HttpTarget {
                uri: update.endpoint_url.clone(),
                http_method: http_method.to_string(),
                headers: update.headers.clone().unwrap_or_default(),
                body: update.body.as_ref().map(api::encode_body),
            })
        } else {
            None
        };

        let wire_job = Job {
            name: self.qualified_name(&update.name),
            http_target,
            schedule: update.schedule.clone(),
            time_zone: update.time_zone.clone(),
            retry_config: update.retry_config.as_ref().map(RetryConfig::from),
        };

        let updated = self
            .client
            .patch_job(&wire_job, &mask, self.job_create_timeout)
            .await
            .map_err(|error| {
                tracing::error!(job = %wire_job.name, error = %error, "failed to update schedule job");
                error
            })?;
        tracing::info!(job = %updated.name, mask = %mask, "schedule job updated");
        Ok(JobHandle { name: updated.name })
    }

    async fn delete_job(&self, name: &str) -> TaskResult<()> {
        let qualified = self.qualified_name(name);
        self.client
            .delete_job(&qualified, self.job_create_timeout)
            .await
            .map_err(|error| {
                tracing::error!(job = %qualified, error = %error, "failed to delete schedule job");
                error
            })?;
        tracing::info!(job = %qualified, "schedule job deleted");
        Ok(())
    }
}
