//! Route binding and once-only provisioning.
//!
//! # Responsibilities
//! - Resolve the callback URL/method when a route is bound
//! - Run provider provisioning exactly once per distinct route identity
//! - Hand out the endpoint records application code triggers through
//!
//! # Design Decisions
//! - Binding the same path twice returns the cached endpoint; provisioning
//!   never runs again for it
//! - The per-binder lock serializes bind-time provisioning, so binding is
//!   safe even off the single-threaded startup path

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::Method;
use tokio::sync::Mutex;

use crate::binding::endpoint::{DelayedEndpoint, ScheduledEndpoint};
use crate::binding::resolver;
use crate::error::TaskResult;
use crate::providers::{DelayedTaskProvider, ScheduleProvider};

/// Binds routes to a delayed-task backend.
pub struct DelayedBinder {
    base_url: String,
    provider: Arc<dyn DelayedTaskProvider>,
    bound: Mutex<HashMap<String, DelayedEndpoint>>,
}

impl DelayedBinder {
    /// The provider instance is constructed once by the application and
    /// injected here; there is no process-wide default client.
    pub fn new(base_url: impl Into<String>, provider: Arc<dyn DelayedTaskProvider>) -> Self {
        Self {
            base_url: base_url.into(),
            provider,
            bound: Mutex::new(HashMap::new()),
        }
    }

    /// Bind a route: resolve its callback URL and canonical method,
    /// provision backend resources, and return the endpoint record.
    pub async fn bind(&self, path: &str, methods: &[Method]) -> TaskResult<DelayedEndpoint> {
        let mut bound = self.bound.lock().await;
        if let Some(endpoint) = bound.get(path) {
            tracing::debug!(path, "route already bound, reusing endpoint");
            return Ok(endpoint.clone());
        }

        let endpoint_url = resolver::resolve_url(&self.base_url, path)?;
        let http_method = resolver::resolve_method(methods);
        self.provider.provision().await?;

        let endpoint =
            DelayedEndpoint::new(endpoint_url.clone(), http_method.clone(), self.provider.clone());
        bound.insert(path.to_string(), endpoint.clone());
        tracing::info!(endpoint_url = %endpoint_url, method = %http_method, "delayed route bound");
        Ok(endpoint)
    }
}

/// Binds routes to a schedule backend.
pub struct ScheduleBinder {
    base_url: String,
    provider: Arc<dyn ScheduleProvider>,
    bound: Mutex<HashMap<String, ScheduledEndpoint>>,
}

impl ScheduleBinder {
    pub fn new(base_url: impl Into<String>, provider: Arc<dyn ScheduleProvider>) -> Self {
        Self {
            base_url: base_url.into(),
            provider,
            bound: Mutex::new(HashMap::new()),
        }
    }

    pub async fn bind(&self, path: &str, methods: &[Method]) -> TaskResult<ScheduledEndpoint> {
        let mut bound = self.bound.lock().await;
        if let Some(endpoint) = bound.get(path) {
            tracing::debug!(path, "route already bound, reusing endpoint");
            return Ok(endpoint.clone());
        }

        let endpoint_url = resolver::resolve_url(&self.base_url, path)?;
        let http_method = resolver::resolve_method(methods);
        self.provider.provision().await?;

        let endpoint = ScheduledEndpoint::new(
            endpoint_url.clone(),
            http_method.clone(),
            self.provider.clone(),
        );
        bound.insert(path.to_string(), endpoint.clone());
        tracing::info!(endpoint_url = %endpoint_url, method = %http_method, "scheduled route bound");
        Ok(endpoint)
    }
}
