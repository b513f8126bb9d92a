//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges and required identifiers per selected backend
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: DeferConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;
use url::Url;

use crate::config::schema::{BackendKind, DeferConfig};

/// A single semantic violation in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("base_url: {0}")]
    BaseUrl(String),

    #[error("{field}: {reason}")]
    Field { field: &'static str, reason: String },
}

fn field(field: &'static str, reason: impl Into<String>) -> ValidationError {
    ValidationError::Field {
        field,
        reason: reason.into(),
    }
}

/// Validate the whole configuration, collecting every violation.
pub fn validate_config(config: &DeferConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match Url::parse(&config.base_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(ValidationError::BaseUrl(format!(
            "unsupported scheme '{}'",
            url.scheme()
        ))),
        Err(e) => errors.push(ValidationError::BaseUrl(e.to_string())),
    }

    match config.backend {
        BackendKind::Gcp => {
            if config.gcp.queue_path.split('/').count() != 6 {
                errors.push(field(
                    "gcp.queue_path",
                    "expected projects/P/locations/L/queues/Q",
                ));
            }
            if config.gcp.location_path.split('/').count() != 4 {
                errors.push(field(
                    "gcp.location_path",
                    "expected projects/P/locations/L",
                ));
            }
            if !(config.gcp.job_create_timeout_secs > 0.0) {
                errors.push(field("gcp.job_create_timeout_secs", "must be > 0"));
            }
        }
        BackendKind::Aws => {
            if config.aws.region.is_empty() {
                errors.push(field("aws.region", "must not be empty"));
            }
            if config.aws.account_id.is_empty() {
                errors.push(field("aws.account_id", "must not be empty"));
            }
            if config.aws.queue_name.is_empty() {
                errors.push(field("aws.queue_name", "must not be empty"));
            }
            if config.aws.relay_function_name.is_empty() {
                errors.push(field("aws.relay_function_name", "must not be empty"));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gcp_config() -> DeferConfig {
        let mut config = DeferConfig::default();
        config.base_url = "https://svc.example.com".to_string();
        config.gcp.queue_path = "projects/p/locations/eu/queues/q".to_string();
        config.gcp.location_path = "projects/p/locations/eu".to_string();
        config
    }

    #[test]
    fn valid_gcp_config_passes() {
        assert!(validate_config(&gcp_config()).is_ok());
    }

    #[test]
    fn collects_every_violation() {
        let mut config = gcp_config();
        config.base_url = "nope".to_string();
        config.gcp.queue_path = "q".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn aws_backend_requires_account_id() {
        let mut config = gcp_config();
        config.backend = BackendKind::Aws;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::Field { field: "aws.account_id", .. })));
    }
}
