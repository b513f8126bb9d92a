//! Callback URL and method resolution.
//!
//! # Responsibilities
//! - Derive the absolute callback URL for a bound route
//! - Reduce a route's declared methods to the single canonical one
//!
//! # Design Decisions
//! - Pure computation, no network access
//! - Multiple declared methods silently reduce to the first; deferred
//!   endpoints should declare a single method

use axum::http::Method;
use url::Url;

use crate::error::{TaskError, TaskResult};

/// `base_url + path`, with the base checked to be an absolute http(s) URL.
pub fn resolve_url(base_url: &str, path: &str) -> TaskResult<String> {
    let parsed =
        Url::parse(base_url).map_err(|e| TaskError::validation("base_url", e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => {}
        other => {
            return Err(TaskError::validation(
                "base_url",
                format!("unsupported scheme '{other}'"),
            ));
        }
    }

    let base = base_url.trim_end_matches('/');
    if path.starts_with('/') {
        Ok(format!("{base}{path}"))
    } else {
        Ok(format!("{base}/{path}"))
    }
}

/// First declared method wins; POST when none is declared.
pub fn resolve_method(declared: &[Method]) -> Method {
    declared.first().cloned().unwrap_or(Method::POST)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_base_and_path() {
        assert_eq!(
            resolve_url("https://svc.example.com", "/tasks/refresh").unwrap(),
            "https://svc.example.com/tasks/refresh"
        );
    }

    #[test]
    fn normalizes_slashes() {
        assert_eq!(
            resolve_url("https://svc.example.com/", "/x").unwrap(),
            "https://svc.example.com/x"
        );
        assert_eq!(
            resolve_url("https://svc.example.com", "x").unwrap(),
            "https://svc.example.com/x"
        );
    }

    #[test]
    fn rejects_non_http_base() {
        assert!(resolve_url("not a url", "/x").is_err());
        assert!(resolve_url("file:///tmp", "/x").is_err());
    }

    #[test]
    fn first_declared_method_wins() {
        assert_eq!(
            resolve_method(&[Method::PUT, Method::POST]),
            Method::PUT
        );
    }

    #[test]
    fn defaults_to_post() {
        assert_eq!(resolve_method(&[]), Method::POST);
    }
}
