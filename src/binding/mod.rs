//! Endpoint binding subsystem.
//!
//! # Data Flow
//! ```text
//! Route registration (path + declared methods)
//!     → resolver.rs (absolute callback URL, canonical method)
//!     → binder.rs (provision backend resources, once per route)
//!     → endpoint.rs (DelayedEndpoint / ScheduledEndpoint records)
//!
//! Later, from anywhere in the process:
//!     endpoint.delay(...)            → DelayedTaskProvider
//!     endpoint.schedule(...)         → ScheduleProvider
//!     endpoint.update_schedule(...)  → ScheduleProvider
//!     endpoint.delete_schedule(...)  → ScheduleProvider
//! ```
//!
//! # Design Decisions
//! - Per-route state machine: unbound → bound (URL/method resolved) →
//!   provisioned (backend resources ready) → active (endpoint handed out)
//! - Binding happens once; endpoints are cloned freely afterwards

pub mod binder;
pub mod endpoint;
pub mod layer;
pub mod resolver;

pub use binder::{DelayedBinder, ScheduleBinder};
pub use endpoint::{DelayOptions, DelayedEndpoint, ScheduledEndpoint};
pub use layer::log_endpoint_url;
