//! Error definitions shared across binding and providers.

use thiserror::Error;

/// Errors that can occur while enqueueing, scheduling, or provisioning.
#[derive(Debug, Error)]
pub enum TaskError {
    /// Bad input, rejected before any network call.
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// HTTP method the backends cannot deliver.
    #[error("unsupported HTTP method: {0}")]
    BadMethod(String),

    /// The managed service rejected or failed the call.
    #[error("{service} backend call failed: {message}")]
    Backend {
        service: &'static str,
        status: Option<u16>,
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    /// Deletion target does not exist on the backend.
    #[error("schedule job not found: {0}")]
    JobNotFound(String),

    /// Operation the selected backend does not implement.
    #[error("{backend} backend does not support {operation}")]
    Unsupported {
        backend: &'static str,
        operation: &'static str,
    },
}

impl TaskError {
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        TaskError::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// Wrap a transport-level failure, preserving the cause.
    pub(crate) fn transport(service: &'static str, error: reqwest::Error) -> Self {
        TaskError::Backend {
            service,
            status: None,
            message: error.to_string(),
            source: Some(error),
        }
    }

    pub(crate) fn api(service: &'static str, status: u16, message: impl Into<String>) -> Self {
        TaskError::Backend {
            service,
            status: Some(status),
            message: message.into(),
            source: None,
        }
    }

    /// HTTP status reported by the backend, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            TaskError::Backend { status, .. } => *status,
            _ => None,
        }
    }

    /// True when the backend reported a name conflict. Creation paths treat
    /// this as the signal to fall back to an update.
    pub fn is_already_exists(&self) -> bool {
        self.status() == Some(409)
    }
}

/// Result type for deferred-invocation operations.
pub type TaskResult<T> = Result<T, TaskError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_formats_field_and_reason() {
        let err = TaskError::validation("delay_seconds", "must be >= 0");
        assert_eq!(err.to_string(), "invalid delay_seconds: must be >= 0");
        assert!(!err.is_already_exists());
    }

    #[test]
    fn conflict_status_detected() {
        let err = TaskError::api("cloudscheduler", 409, "job exists");
        assert!(err.is_already_exists());
        assert_eq!(err.status(), Some(409));
    }
}
