//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files, and
//! every field has a default so minimal configs work.

use serde::{Deserialize, Serialize};

/// Root configuration for a service using deferred endpoints.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DeferConfig {
    /// Public base URL callbacks are delivered to (e.g. "https://svc.example.com").
    pub base_url: String,

    /// Which backend family handles delivery.
    pub backend: BackendKind,

    /// Listener configuration for the service itself.
    pub listener: ListenerConfig,

    /// GCP backend settings.
    pub gcp: GcpConfig,

    /// AWS backend settings.
    pub aws: AwsConfig,
}

/// Delivery backend family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Gcp,
    Aws,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Cloud Tasks / Cloud Scheduler settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GcpConfig {
    /// Full queue path: projects/P/locations/L/queues/Q.
    pub queue_path: String,

    /// Scheduler location path: projects/P/locations/L.
    pub location_path: String,

    /// Fetch-or-create the queue at bind time.
    pub auto_create_queue: bool,

    /// Bounds job create/update/delete calls.
    pub job_create_timeout_secs: f64,

    /// OAuth bearer token attached to every call. Acquisition and refresh
    /// are the caller's concern.
    pub access_token: Option<String>,

    /// Cloud Tasks endpoint override, for tests.
    pub tasks_endpoint: Option<String>,

    /// Cloud Scheduler endpoint override, for tests.
    pub scheduler_endpoint: Option<String>,
}

impl Default for GcpConfig {
    fn default() -> Self {
        Self {
            queue_path: String::new(),
            location_path: String::new(),
            auto_create_queue: true,
            job_create_timeout_secs: 10.0,
            access_token: None,
            tasks_endpoint: None,
            scheduler_endpoint: None,
        }
    }
}

/// SQS / Lambda / EventBridge settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AwsConfig {
    pub region: String,

    /// Account id, used to derive role ARNs.
    pub account_id: String,

    pub access_key_id: String,

    pub secret_access_key: String,

    pub session_token: Option<String>,

    /// Single endpoint override redirecting every service, for tests.
    pub endpoint: Option<String>,

    /// Delay queue name.
    pub queue_name: String,

    /// Relay Lambda function name, shared by delay and schedule paths.
    pub relay_function_name: String,

    /// Role the relay function runs under.
    pub relay_role_name: String,

    /// Role EventBridge assumes to invoke rule targets.
    pub scheduler_role_name: String,

    /// Runtime for the deployed relay function.
    pub relay_runtime: String,

    /// Long-poll wait used by the self-hosted relay worker.
    pub poll_wait_seconds: u32,

    /// Messages fetched per poll by the self-hosted relay worker.
    pub poll_batch_size: u32,
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            region: "us-east-1".to_string(),
            account_id: String::new(),
            access_key_id: String::new(),
            secret_access_key: String::new(),
            session_token: None,
            endpoint: None,
            queue_name: "delay-queue".to_string(),
            relay_function_name: "delay-relay".to_string(),
            relay_role_name: "sqs-lambda-relay-role".to_string(),
            scheduler_role_name: "eventbridge-scheduler-role".to_string(),
            relay_runtime: "python3.11".to_string(),
            poll_wait_seconds: 10,
            poll_batch_size: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_parses_with_defaults() {
        let config: DeferConfig = toml::from_str(
            r#"
            base_url = "https://svc.example.com"
            backend = "aws"

            [aws]
            account_id = "123456789012"
            "#,
        )
        .unwrap();
        assert_eq!(config.backend, BackendKind::Aws);
        assert_eq!(config.aws.region, "us-east-1");
        assert_eq!(config.aws.queue_name, "delay-queue");
        assert!(config.gcp.auto_create_queue);
    }
}
