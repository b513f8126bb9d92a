//! GCP backend family: Cloud Tasks (delayed delivery) and Cloud Scheduler
//! (cron jobs), both offering the needed primitives natively.

pub mod api;
pub mod client;
pub mod delayer;
pub mod scheduler;

pub use client::GcpApiClient;
pub use delayer::GcpDelayer;
pub use scheduler::GcpScheduler;
