//! Self-hosted relay worker.
//!
//! Polls the delay queue and replays each message as one outbound HTTP
//! request, standing in for the deployed relay function when running the
//! queue-plus-relay backend without Lambda (local stacks, development).

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use axum_cloud_tasks::config::load_config;
use axum_cloud_tasks::providers::aws::AwsApiClient;
use axum_cloud_tasks::relay::{self, RelayPayload};

#[derive(Parser, Debug)]
#[command(name = "relay-worker", about = "Replay queued messages as HTTP calls")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "defer.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "axum_cloud_tasks=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = load_config(&args.config)?;

    let client = AwsApiClient::new(&config.aws);
    let queue_url = client.create_queue(&config.aws.queue_name).await?;
    let http = reqwest::Client::new();

    tracing::info!(queue_url = %queue_url, "relay worker starting");

    loop {
        let messages = match client
            .receive_messages(
                &queue_url,
                config.aws.poll_batch_size,
                config.aws.poll_wait_seconds,
            )
            .await
        {
            Ok(messages) => messages,
            Err(error) => {
                tracing::error!(error = %error, "poll failed, backing off");
                tokio::time::sleep(Duration::from_secs(5)).await;
                continue;
            }
        };

        for message in messages {
            let payload: RelayPayload = match serde_json::from_str(&message.body) {
                Ok(payload) => payload,
                Err(error) => {
                    tracing::error!(
                        message_id = %message.message_id,
                        error = %error,
                        "dropping undecodable message"
                    );
                    let _ = client
                        .delete_message(&queue_url, &message.receipt_handle)
                        .await;
                    continue;
                }
            };

            match relay::deliver(&http, &payload).await {
                Ok(status) => {
                    tracing::debug!(message_id = %message.message_id, status, "message relayed");
                    if let Err(error) = client
                        .delete_message(&queue_url, &message.receipt_handle)
                        .await
                    {
                        tracing::warn!(
                            message_id = %message.message_id,
                            error = %error,
                            "failed to delete relayed message"
                        );
                    }
                }
                Err(error) => {
                    // Leave the message in place; the queue redrives it.
                    tracing::error!(
                        message_id = %message.message_id,
                        error = %error,
                        "relay delivery failed"
                    );
                }
            }
        }
    }
}
