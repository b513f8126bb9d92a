//! Idempotent provisioning of the queue-plus-relay infrastructure.
//!
//! # Responsibilities
//! - Create the permission roles, relay function, queue, and event-source
//!   wiring the composed backend needs
//! - Resolve conflicts (409) to the already-existing resource
//!
//! # Design Decisions
//! - Every step is fetch-or-create; running provisioning twice must not
//!   corrupt backend state
//! - The relay deployment archive ships inside the crate and is uploaded
//!   as-is

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::json;

use crate::error::TaskResult;
use crate::providers::aws::api::{CreateEventSourceMappingRequest, CreateFunctionRequest, FunctionCode};
use crate::providers::aws::client::AwsApiClient;

/// Packaged relay Lambda (see `resources/relay_handler.py`).
static RELAY_ZIP: &[u8] = include_bytes!("resources/relay.zip");

const RELAY_HANDLER: &str = "relay_handler.lambda_handler";

/// Handles for the delayed-delivery path: role, relay function, and queue.
#[derive(Debug, Clone)]
pub struct DelayResources {
    pub role_arn: String,
    pub function_arn: String,
    pub queue_url: String,
}

/// Handles for the recurring-delivery path: role and relay function.
#[derive(Debug, Clone)]
pub struct ScheduleResources {
    pub role_arn: String,
    pub function_arn: String,
}

/// Everything `enqueue_delayed` needs: role → relay function → queue →
/// event-source mapping from the queue into the function.
pub async fn provision_delay_resources(
    client: &AwsApiClient,
    role_name: &str,
    function_name: &str,
    queue_name: &str,
    runtime: &str,
) -> TaskResult<DelayResources> {
    let role_arn = ensure_relay_role(client, role_name).await?;
    let function_arn = deploy_relay_function(client, function_name, &role_arn, runtime).await?;
    let queue_url = client.create_queue(queue_name).await?;
    let queue_arn = client.queue_arn(&queue_url).await?;
    link_queue_to_relay(client, &queue_arn, function_name).await?;

    tracing::info!(
        queue_url = %queue_url,
        function_arn = %function_arn,
        "delay resources provisioned"
    );
    Ok(DelayResources {
        role_arn,
        function_arn,
        queue_url,
    })
}

/// Everything the schedule path needs: a scheduler-assumable role and the
/// relay function rules will target.
pub async fn provision_schedule_resources(
    client: &AwsApiClient,
    scheduler_role_name: &str,
    relay_role_name: &str,
    function_name: &str,
    runtime: &str,
) -> TaskResult<ScheduleResources> {
    let role_arn = ensure_scheduler_role(client, scheduler_role_name).await?;
    let relay_role_arn = ensure_relay_role(client, relay_role_name).await?;
    let function_arn = deploy_relay_function(client, function_name, &relay_role_arn, runtime).await?;

    tracing::info!(function_arn = %function_arn, "schedule resources provisioned");
    Ok(ScheduleResources {
        role_arn,
        function_arn,
    })
}

/// Role the relay function runs under, with queue-consume permissions.
async fn ensure_relay_role(client: &AwsApiClient, role_name: &str) -> TaskResult<String> {
    let assume_policy = assume_role_policy("lambda.amazonaws.com");
    match client.create_role(role_name, &assume_policy).await {
        Ok(()) => tracing::info!(role = role_name, "role created"),
        Err(error) if error.is_already_exists() => {
            tracing::debug!(role = role_name, "role exists");
        }
        Err(error) => return Err(error),
    }

    let policy = json!({
        "Version": "2012-10-17",
        "Statement": [{
            "Effect": "Allow",
            "Action": [
                "sqs:SendMessage",
                "sqs:ReceiveMessage",
                "sqs:DeleteMessage",
                "sqs:GetQueueAttributes",
                "lambda:InvokeFunction",
                "logs:CreateLogGroup",
                "logs:CreateLogStream",
                "logs:PutLogEvents"
            ],
            "Resource": "*"
        }]
    })
    .to_string();
    client
        .put_role_policy(role_name, "relay-queue-access", &policy)
        .await?;

    Ok(client.role_arn(role_name))
}

/// Role EventBridge assumes to invoke rule targets.
async fn ensure_scheduler_role(client: &AwsApiClient, role_name: &str) -> TaskResult<String> {
    let assume_policy = assume_role_policy("events.amazonaws.com");
    match client.create_role(role_name, &assume_policy).await {
        Ok(()) => tracing::info!(role = role_name, "role created"),
        Err(error) if error.is_already_exists() => {
            tracing::debug!(role = role_name, "role exists");
        }
        Err(error) => return Err(error),
    }
    Ok(client.role_arn(role_name))
}

/// Upload the packaged relay; a name conflict resolves to the deployed
/// function's ARN.
async fn deploy_relay_function(
    client: &AwsApiClient,
    function_name: &str,
    role_arn: &str,
    runtime: &str,
) -> TaskResult<String> {
    let request = CreateFunctionRequest {
        function_name: function_name.to_string(),
        runtime: runtime.to_string(),
        role: role_arn.to_string(),
        handler: RELAY_HANDLER.to_string(),
        code: FunctionCode {
            zip_file: BASE64.encode(RELAY_ZIP),
        },
        environment: None,
    };

    match client.create_function(&request).await {
        Ok(configuration) => {
            tracing::info!(function_arn = %configuration.function_arn, "relay function deployed");
            Ok(configuration.function_arn)
        }
        Err(error) if error.is_already_exists() => {
            let existing = client.get_function(function_name).await?;
            tracing::debug!(function_arn = %existing.function_arn, "relay function exists");
            Ok(existing.function_arn)
        }
        Err(error) => Err(error),
    }
}

/// Event-source mapping from the queue into the relay; a conflict means the
/// wiring is already in place.
async fn link_queue_to_relay(
    client: &AwsApiClient,
    queue_arn: &str,
    function_name: &str,
) -> TaskResult<()> {
    let request = CreateEventSourceMappingRequest {
        event_source_arn: queue_arn.to_string(),
        function_name: function_name.to_string(),
        enabled: true,
        batch_size: 10,
    };
    match client.create_event_source_mapping(&request).await {
        Ok(()) => Ok(()),
        Err(error) if error.is_already_exists() => {
            tracing::debug!(queue_arn, "event source mapping exists");
            Ok(())
        }
        Err(error) => Err(error),
    }
}

fn assume_role_policy(service_principal: &str) -> String {
    json!({
        "Version": "2012-10-17",
        "Statement": [{
            "Effect": "Allow",
            "Principal": {"Service": service_principal},
            "Action": "sts:AssumeRole"
        }]
    })
    .to_string()
}
