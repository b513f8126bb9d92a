//! GCP-backed demo: a small service whose endpoints can be invoked later
//! through Cloud Tasks (delay) and Cloud Scheduler (cron).
//!
//! Run with a `defer.toml` carrying `backend = "gcp"` and the queue and
//! location paths, or rely on the defaults and a local mock.

use std::path::Path;
use std::sync::Arc;

use axum::extract::State;
use axum::http::Method;
use axum::routing::post;
use axum::{middleware, Json, Router};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use axum_cloud_tasks::binding::log_endpoint_url;
use axum_cloud_tasks::config::{load_config, DeferConfig};
use axum_cloud_tasks::providers::gcp::{GcpApiClient, GcpDelayer, GcpScheduler};
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

    let config = if Path::new("defer.toml").exists() {
        load_config(Path::new("defer.toml"))?
    } else {
        let mut config = DeferConfig::default();
        config.base_url = "http://localhost:8080".to_string();
        config.gcp.queue_path = "projects/demo/locations/europe-west1/queues/deferred".to_string();
        config.gcp.location_path = "projects/demo/locations/europe-west1".to_string();
        config
    };

    let client = GcpApiClient::new(&config.gcp);
    let delayer = Arc::new(GcpDelayer::new(client.clone(), &config.gcp));
    let scheduler = Arc::new(GcpScheduler::new(client, &config.gcp));

    let delayed = DelayedBinder::new(&config.base_url, delayer);
    let scheduled = ScheduleBinder::new(&config.base_url, scheduler);

    // Binding resolves the callback URL and provisions the queue once.
    let refresh = delayed.bind("/tasks/refresh", &[Method::POST]).await?;
    let report = scheduled.bind("/reports/daily", &[Method::POST]).await?;

    // Every day at 08:00 UTC.
    report
        .schedule(ScheduleJob::named("daily-report", "0 8 * * *"))
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

/// The deferred callback target.
async fn refresh_handler(Json(payload): Json<serde_json::Value>) -> &'static str {
    tracing::info!(payload = %payload, "refresh triggered");
    "refreshed"
}

/// The scheduled callback target.
async fn report_handler() -> &'static str {
    tracing::info!("daily report triggered");
    "reported"
}

/// Hitting /kick queues a refresh 30 seconds out.
async fn kick_handler(State(state): State<AppState>) -> &'static str {
    let mut options = DelayOptions::after_seconds(30);
    options.body = Some(serde_json::json!({"reason": "kicked"}));
    state.refresh.delay(options).await;
    "refresh queued"
}
