//! Provider abstraction over the delivery backends.
//!
//! # Data Flow
//! ```text
//! Bound endpoint (binding::endpoint)
//!     → DeferredTask / ScheduleJob (task.rs)
//!     → DelayedTaskProvider / ScheduleProvider (this module)
//!     → gcp::* (Cloud Tasks + Cloud Scheduler, native delayed/cron delivery)
//!     → aws::* (SQS + relay Lambda + EventBridge, composed delivery)
//! ```
//!
//! # Design Decisions
//! - Two narrow interfaces, one conforming implementation per backend family
//! - The binder depends only on the traits; providers are injected at
//!   construction, never pulled from process-wide state
//! - Provisioning lives on the provider and is idempotent; callers may
//!   invoke it any number of times

use async_trait::async_trait;

use crate::error::TaskResult;

pub mod aws;
pub mod gcp;
pub mod task;

pub use task::{
    DeferredTask, JobHandle, JobRetryConfig, ScheduleJob, ScheduleJobUpdate, TaskHandle,
};

/// Backend that can fire a one-shot HTTP call after a delay.
#[async_trait]
pub trait DelayedTaskProvider: Send + Sync {
    /// Ensure the backend resources this provider enqueues into exist.
    /// Idempotent; invoked once per bound route by the binder.
    async fn provision(&self) -> TaskResult<()> {
        Ok(())
    }

    /// Submit one task for future delivery. Returns as soon as the enqueue
    /// call completes; the HTTP call itself fires later, out of process.
    async fn enqueue_delayed(&self, task: DeferredTask) -> TaskResult<TaskHandle>;
}

/// Backend that can fire a named, cron-driven recurring HTTP call.
#[async_trait]
pub trait ScheduleProvider: Send + Sync {
    /// Ensure the backend resources recurring jobs rely on exist.
    async fn provision(&self) -> TaskResult<()> {
        Ok(())
    }

    /// Create the job, or update it in place when the name already exists.
    async fn upsert_job(&self, job: ScheduleJob) -> TaskResult<JobHandle>;

    /// Replace only the fields named by the update's mask.
    async fn update_job(&self, update: ScheduleJobUpdate) -> TaskResult<JobHandle>;

    /// Remove the job by name. Removal affects future firings only.
    async fn delete_job(&self, name: &str) -> TaskResult<()>;
}
