//! Delayed and scheduled invocation of axum endpoints via cloud task backends.
//!
//! Bind a route once, then trigger it later from anywhere in the process:
//!
//! ```text
//! bind(path, methods)
//!     → binding (resolve callback URL/method, provision backend, once)
//!     → DelayedEndpoint / ScheduledEndpoint
//!
//! endpoint.delay(...)     one-shot call after a delay (fire-and-forget)
//! endpoint.schedule(...)  named cron job (create-or-update)
//!
//! providers::gcp  Cloud Tasks + Cloud Scheduler (native delayed/cron delivery)
//! providers::aws  SQS + relay Lambda + EventBridge (composed delivery)
//! ```
//!
//! The actual waiting and triggering happens in the backend; this crate only
//! issues the enqueue/create calls and returns.

pub mod binding;
pub mod config;
pub mod error;
pub mod providers;
pub mod relay;

pub use binding::{DelayOptions, DelayedBinder, DelayedEndpoint, ScheduleBinder, ScheduledEndpoint};
pub use config::DeferConfig;
pub use error::{TaskError, TaskResult};
pub use providers::{
    DeferredTask, DelayedTaskProvider, JobHandle, JobRetryConfig, ScheduleJob, ScheduleJobUpdate,
    ScheduleProvider, TaskHandle,
};
