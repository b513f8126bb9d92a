//! Authenticated REST client for Cloud Tasks and Cloud Scheduler.
//!
//! # Responsibilities
//! - Issue queue, task, and job calls against the Google APIs
//! - Map the Google error envelope into [`TaskError`]
//! - Keep per-call creation timeouts
//!
//! # Design Decisions
//! - Plain REST over reqwest; no vendor SDK
//! - Bearer token supplied by the caller; token acquisition is out of scope
//! - Endpoints are overridable so tests can point at a local mock

use std::time::Duration;

use axum::http::Method;

use crate::config::GcpConfig;
use crate::error::{TaskError, TaskResult};
use crate::providers::gcp::api::{CreateTaskRequest, ErrorEnvelope, Job, Queue, Task};

const TASKS_ENDPOINT: &str = "https://cloudtasks.googleapis.com";
const SCHEDULER_ENDPOINT: &str = "https://cloudscheduler.googleapis.com";

const TASKS_SERVICE: &str = "cloudtasks";
const SCHEDULER_SERVICE: &str = "cloudscheduler";

/// REST client shared by the GCP delayer and scheduler.
#[derive(Debug, Clone)]
pub struct GcpApiClient {
    http: reqwest::Client,
    tasks_endpoint: String,
    scheduler_endpoint: String,
    auth_token: Option<String>,
}

impl GcpApiClient {
    pub fn new(config: &GcpConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            tasks_endpoint: config
                .tasks_endpoint
                .clone()
                .unwrap_or_else(|| TASKS_ENDPOINT.to_string()),
            scheduler_endpoint: config
                .scheduler_endpoint
                .clone()
                .unwrap_or_else(|| SCHEDULER_ENDPOINT.to_string()),
            auth_token: config.access_token.clone(),
        }
    }

    /// Fetch a queue by its full path, `None` when it does not exist.
    pub async fn get_queue(&self, queue_path: &str) -> TaskResult<Option<Queue>> {
        let url = format!("{}/v2/{}", self.tasks_endpoint, queue_path);
        let request = self.http.request(Method::GET, url);
        match self.execute(TASKS_SERVICE, request).await {
            Ok(response) => {
                let queue = response
                    .json::<Queue>()
                    .await
                    .map_err(|e| TaskError::transport(TASKS_SERVICE, e))?;
                Ok(Some(queue))
            }
            Err(error) if error.status() == Some(404) => Ok(None),
            Err(error) => Err(error),
        }
    }

    /// Create the queue named by `queue_path` under its parent location.
    pub async fn create_queue(&self, queue_path: &str) -> TaskResult<Queue> {
        let parent = queue_parent(queue_path)?;
        let url = format!("{}/v2/{}/queues", self.tasks_endpoint, parent);
        let queue = Queue {
            name: queue_path.to_string(),
            state: None,
        };
        let request = self.http.request(Method::POST, url).json(&queue);
        let response = self.execute(TASKS_SERVICE, request).await?;
        response
            .json::<Queue>()
            .await
            .map_err(|e| TaskError::transport(TASKS_SERVICE, e))
    }

    /// Submit one task to the queue. `timeout` bounds this creation call.
    pub async fn create_task(
        &self,
        queue_path: &str,
        task: Task,
        timeout: Duration,
    ) -> TaskResult<Task> {
        let url = format!("{}/v2/{}/tasks", self.tasks_endpoint, queue_path);
        let request = self
            .http
            .request(Method::POST, url)
            .timeout(timeout)
            .json(&CreateTaskRequest { task });
        let response = self.execute(TASKS_SERVICE, request).await?;
        response
            .json::<Task>()
            .await
            .map_err(|e| TaskError::transport(TASKS_SERVICE, e))
    }

    /// Create a scheduler job under the location. A 409 surfaces as
    /// `TaskError::Backend { status: Some(409), .. }` for the upsert
    /// fallback to match on.
    pub async fn create_job(
        &self,
        location_path: &str,
        job: &Job,
        timeout: Duration,
    ) -> TaskResult<Job> {
        let url = format!("{}/v1/{}/jobs", self.scheduler_endpoint, location_path);
        let request = self
            .http
            .request(Method::POST, url)
            .timeout(timeout)
            .json(job);
        let response = self.execute(SCHEDULER_SERVICE, request).await?;
        response
            .json::<Job>()
            .await
            .map_err(|e| TaskError::transport(SCHEDULER_SERVICE, e))
    }

    /// Patch an existing job, replacing only the masked fields.
    pub async fn patch_job(&self, job: &Job, update_mask: &str, timeout: Duration) -> TaskResult<Job> {
        let url = format!(
            "{}/v1/{}?updateMask={}",
            self.scheduler_endpoint, job.name, update_mask
        );
        let request = self
            .http
            .request(Method::PATCH, url)
            .timeout(timeout)
            .json(job);
        let response = self.execute(SCHEDULER_SERVICE, request).await?;
        response
            .json::<Job>()
            .await
            .map_err(|e| TaskError::transport(SCHEDULER_SERVICE, e))
    }

    /// Delete a job by its fully-qualified name. A missing job surfaces as
    /// [`TaskError::JobNotFound`], not as a silent success.
    pub async fn delete_job(&self, job_name: &str, timeout: Duration) -> TaskResult<()> {
        let url = format!("{}/v1/{}", self.scheduler_endpoint, job_name);
        let request = self.http.request(Method::DELETE, url).timeout(timeout);
        match self.execute(SCHEDULER_SERVICE, request).await {
            Ok(_) => Ok(()),
            Err(error) if error.status() == Some(404) => {
                Err(TaskError::JobNotFound(job_name.to_string()))
            }
            Err(error) => Err(error),
        }
    }

    async fn execute(
        &self,
        service: &'static str,
        request: reqwest::RequestBuilder,
    ) -> TaskResult<reqwest::Response> {
        let request = match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let response = request
            .send()
            .await
            .map_err(|e| TaskError::transport(service, e))?;
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorEnvelope>(&text)
            .map(|envelope| envelope.error.message)
            .unwrap_or(text);
        tracing::warn!(service, status, message = %message, "backend rejected request");
        Err(TaskError::api(service, status, message))
    }
}

/// Parent location of a queue path:
/// `projects/P/locations/L/queues/Q` → `projects/P/locations/L`.
fn queue_parent(queue_path: &str) -> TaskResult<String> {
    let segments: Vec<&str> = queue_path.split('/').collect();
    if segments.len() != 6 || segments[0] != "projects" || segments[2] != "locations" {
        return Err(TaskError::validation(
            "queue_path",
            format!("expected projects/P/locations/L/queues/Q, got '{queue_path}'"),
        ));
    }
    Ok(segments[..4].join("/"))
}
