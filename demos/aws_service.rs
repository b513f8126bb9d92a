//! AWS-backed demo: the same service shape as the GCP demo, delivered
//! through SQS, the relay function, and EventBridge rules.
//!
//! Needs a `defer.toml` with `backend = "aws"`, an account id, and
//! credentials (or an endpoint override pointing at a local stack).

use std::path::Path;
use std::sync::Arc;

use axum::extract::State;
use axum::http::Method;
use axum::routing::post;
use axum::{middleware, Json, Router};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use axum_cloud_tasks::binding::log_endpoint_url;
use axum_cloud_tasks::config::load_config;
use axum_cloud_tasks::providers::aws::{AwsApiClient, EventBridgeScheduler, SqsDelayer};
use axum_cloud_tasks::{DelayOptions, DelayedBinder, DelayedEndpoint, ScheduleBinder, ScheduleJob};

#[derive(Clone)]
struct AppState {
    refresh: DelayedEndpoint,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "axum_cloud_tasks=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = load_config(Path::new("defer.toml"))?;

    let client = AwsApiClient::new(&config.aws);
    let delayer = Arc::new(SqsDelayer::new(client.clone(), &config.aws));
    let scheduler = Arc::new(EventBridgeScheduler::new(client, &config.aws));

    let delayed = DelayedBinder::new(&config.base_url, delayer);
    let scheduled = ScheduleBinder::new(&config.base_url, scheduler);

    // Binding provisions the role, relay function, queue, and wiring once.
    let refresh = delayed.bind("/tasks/refresh", &[Method::POST]).await?;
    let report = scheduled.bind("/reports/daily", &[Method::POST]).await?;

    // EventBridge cron syntax.
    report
        .schedule(ScheduleJob::named("daily-report", "cron(0 8 * * ? *)"))
        .await?;

    let state = AppState { refresh };
    let app = Router::new()
        .route("/tasks/refresh", post(refresh_handler))
        .route("/reports/daily", post(report_handler))
        .route("/kick", post(kick_handler))
        .with_state(state)
        .layer(middleware::from_fn(log_endpoint_url))
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %config.listener.bind_address, "demo service listening");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn refresh_handler(Json(payload): Json<serde_json::Value>) -> &'static str {
    tracing::info!(payload = %payload, "refresh triggered");
    "refreshed"
}

async fn report_handler() -> &'static str {
    tracing::info!("daily report triggered");
    "reported"
}

/// Hitting /kick queues a refresh 60 seconds out.
async fn kick_handler(State(state): State<AppState>) -> &'static str {
    let mut options = DelayOptions::after_seconds(60);
    options.body = Some(serde_json::json!({"reason": "kicked"}));
    state.refresh.delay(options).await;
    "refresh queued"
}
