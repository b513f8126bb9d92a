//! Request-logging middleware for bound routes.

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;

/// Log the absolute URL and method of each inbound request. Attach with
/// `axum::middleware::from_fn(log_endpoint_url)`.
pub async fn log_endpoint_url(request: Request, next: Next) -> Response {
    tracing::debug!(
        endpoint_url = %request.uri(),
        method = %request.method(),
        "handling bound endpoint request"
    );
    next.run(request).await
}
