//! Signed REST client for SQS, EventBridge, Lambda, and IAM.
//!
//! # Responsibilities
//! - Issue SigV4-signed calls against the service JSON/REST protocols
//! - Map service error bodies (`__type`/`message`) into [`TaskError`]
//!
//! # Design Decisions
//! - Plain REST over reqwest; no vendor SDK
//! - IAM answers in XML, so role calls are checked by status code only and
//!   role ARNs are derived from the configured account id
//! - A single endpoint override redirects every service, so tests can point
//!   the whole client at one local mock

use axum::http::Method;
use chrono::Utc;
use url::Url;

use crate::config::AwsConfig;
use crate::error::{TaskError, TaskResult};
use crate::providers::aws::api::{
    AwsErrorBody, CreateEventSourceMappingRequest, CreateFunctionRequest, CreateQueueRequest,
    CreateQueueResponse, DeleteMessageRequest, FunctionConfiguration, GetFunctionResponse,
    GetQueueAttributesRequest, GetQueueAttributesResponse, PutRuleRequest, PutRuleResponse,
    PutTargetsRequest, PutTargetsResponse, ReceiveMessageRequest, ReceiveMessageResponse,
    RuleTarget, SendMessageRequest, SendMessageResponse, SqsMessage,
};
use crate::providers::aws::sign::{sign_request, Credentials};

const SQS_JSON: &str = "application/x-amz-json-1.0";
const EVENTS_JSON: &str = "application/x-amz-json-1.1";
const IAM_FORM: &str = "application/x-www-form-urlencoded";
const IAM_API_VERSION: &str = "2010-05-08";
const LAMBDA_API_VERSION: &str = "2015-03-31";

/// Signed REST client shared by the AWS delayer, scheduler, and
/// provisioning helpers.
#[derive(Debug, Clone)]
pub struct AwsApiClient {
    http: reqwest::Client,
    region: String,
    account_id: String,
    credentials: Credentials,
    endpoint_override: Option<String>,
}

impl AwsApiClient {
    pub fn new(config: &AwsConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            region: config.region.clone(),
            account_id: config.account_id.clone(),
            credentials: Credentials {
                access_key_id: config.access_key_id.clone(),
                secret_access_key: config.secret_access_key.clone(),
                session_token: config.session_token.clone(),
            },
            endpoint_override: config.endpoint.clone(),
        }
    }

    // --- SQS ---

    pub async fn send_message(
        &self,
        queue_url: &str,
        message_body: String,
        delay_seconds: Option<i64>,
    ) -> TaskResult<SendMessageResponse> {
        let request = SendMessageRequest {
            queue_url: queue_url.to_string(),
            message_body,
            delay_seconds,
        };
        let response = self
            .target_call("sqs", "AmazonSQS.SendMessage", SQS_JSON, &request)
            .await?;
        self.decode("sqs", response).await
    }

    /// Create the queue, returning its URL. SQS treats re-creation with the
    /// same attributes as a fetch.
    pub async fn create_queue(&self, queue_name: &str) -> TaskResult<String> {
        let request = CreateQueueRequest {
            queue_name: queue_name.to_string(),
        };
        let response = self
            .target_call("sqs", "AmazonSQS.CreateQueue", SQS_JSON, &request)
            .await?;
        let decoded: CreateQueueResponse = self.decode("sqs", response).await?;
        Ok(decoded.queue_url)
    }

    pub async fn queue_arn(&self, queue_url: &str) -> TaskResult<String> {
        let request = GetQueueAttributesRequest {
            queue_url: queue_url.to_string(),
            attribute_names: vec!["QueueArn".to_string()],
        };
        let response = self
            .target_call("sqs", "AmazonSQS.GetQueueAttributes", SQS_JSON, &request)
            .await?;
        let decoded: GetQueueAttributesResponse = self.decode("sqs", response).await?;
        decoded
            .attributes
            .get("QueueArn")
            .cloned()
            .ok_or_else(|| TaskError::api("sqs", 200, "QueueArn attribute missing"))
    }

    pub async fn receive_messages(
        &self,
        queue_url: &str,
        max_messages: u32,
        wait_seconds: u32,
    ) -> TaskResult<Vec<SqsMessage>> {
        let request = ReceiveMessageRequest {
            queue_url: queue_url.to_string(),
            max_number_of_messages: max_messages,
            wait_time_seconds: wait_seconds,
        };
        let response = self
            .target_call("sqs", "AmazonSQS.ReceiveMessage", SQS_JSON, &request)
            .await?;
        let decoded: ReceiveMessageResponse = self.decode("sqs", response).await?;
        Ok(decoded.messages)
    }

    pub async fn delete_message(&self, queue_url: &str, receipt_handle: &str) -> TaskResult<()> {
        let request = DeleteMessageRequest {
            queue_url: queue_url.to_string(),
            receipt_handle: receipt_handle.to_string(),
        };
        self.target_call("sqs", "AmazonSQS.DeleteMessage", SQS_JSON, &request)
            .await?;
        Ok(())
    }

    // --- EventBridge ---

    pub async fn put_rule(&self, name: &str, schedule_expression: &str) -> TaskResult<String> {
        let request = PutRuleRequest {
            name: name.to_string(),
            schedule_expression: schedule_expression.to_string(),
            state: "ENABLED".to_string(),
            description: "deferred endpoint schedule".to_string(),
        };
        let response = self
            .target_call("events", "AWSEvents.PutRule", EVENTS_JSON, &request)
            .await?;
        let decoded: PutRuleResponse = self.decode("events", response).await?;
        Ok(decoded.rule_arn)
    }

    pub async fn put_targets(&self, rule: &str, targets: Vec<RuleTarget>) -> TaskResult<()> {
        let request = PutTargetsRequest {
            rule: rule.to_string(),
            targets,
        };
        let response = self
            .target_call("events", "AWSEvents.PutTargets", EVENTS_JSON, &request)
            .await?;
        let decoded: PutTargetsResponse = self.decode("events", response).await?;
        if decoded.failed_entry_count > 0 {
            return Err(TaskError::api(
                "events",
                200,
                format!("{} target entries failed", decoded.failed_entry_count),
            ));
        }
        Ok(())
    }

    // --- Lambda ---

    pub async fn create_function(
        &self,
        request: &CreateFunctionRequest,
    ) -> TaskResult<FunctionConfiguration> {
        let url = self.url("lambda", &format!("/{LAMBDA_API_VERSION}/functions"))?;
        let body = serde_json::to_vec(request)
            .map_err(|e| TaskError::validation("function", e.to_string()))?;
        let response = self
            .signed_send("lambda", Method::POST, url, body, "application/json", None)
            .await?;
        self.decode("lambda", response).await
    }

    pub async fn get_function(&self, function_name: &str) -> TaskResult<FunctionConfiguration> {
        let url = self.url(
            "lambda",
            &format!("/{LAMBDA_API_VERSION}/functions/{function_name}"),
        )?;
        let response = self
            .signed_send("lambda", Method::GET, url, Vec::new(), "application/json", None)
            .await?;
        let decoded: GetFunctionResponse = self.decode("lambda", response).await?;
        Ok(decoded.configuration)
    }

    pub async fn create_event_source_mapping(
        &self,
        request: &CreateEventSourceMappingRequest,
    ) -> TaskResult<()> {
        let url = self.url(
            "lambda",
            &format!("/{LAMBDA_API_VERSION}/event-source-mappings/"),
        )?;
        let body = serde_json::to_vec(request)
            .map_err(|e| TaskError::validation("event_source_mapping", e.to_string()))?;
        self.signed_send("lambda", Method::POST, url, body, "application/json", None)
            .await?;
        Ok(())
    }

    // --- IAM ---

    /// Create a role. IAM answers in XML, so the outcome is judged by
    /// status code alone; a 409 reaches the caller for conflict handling.
    pub async fn create_role(&self, role_name: &str, assume_policy: &str) -> TaskResult<()> {
        self.iam_call(&[
            ("Action", "CreateRole"),
            ("Version", IAM_API_VERSION),
            ("RoleName", role_name),
            ("AssumeRolePolicyDocument", assume_policy),
        ])
        .await
    }

    pub async fn put_role_policy(
        &self,
        role_name: &str,
        policy_name: &str,
        policy: &str,
    ) -> TaskResult<()> {
        self.iam_call(&[
            ("Action", "PutRolePolicy"),
            ("Version", IAM_API_VERSION),
            ("RoleName", role_name),
            ("PolicyName", policy_name),
            ("PolicyDocument", policy),
        ])
        .await
    }

    /// Role ARN derived from the configured account id.
    pub fn role_arn(&self, role_name: &str) -> String {
        format!("arn:aws:iam::{}:role/{role_name}", self.account_id)
    }

    // --- plumbing ---

    fn endpoint(&self, service: &str) -> String {
        if let Some(endpoint) = &self.endpoint_override {
            return endpoint.trim_end_matches('/').to_string();
        }
        match service {
            "iam" => "https://iam.amazonaws.com".to_string(),
            _ => format!("https://{service}.{}.amazonaws.com", self.region),
        }
    }

    fn url(&self, service: &str, path: &str) -> TaskResult<Url> {
        let raw = format!("{}{path}", self.endpoint(service));
        Url::parse(&raw).map_err(|e| TaskError::validation("endpoint", e.to_string()))
    }

    /// POST to a `X-Amz-Target` JSON protocol service.
    async fn target_call(
        &self,
        service: &'static str,
        target: &str,
        content_type: &'static str,
        request: &impl serde::Serialize,
    ) -> TaskResult<reqwest::Response> {
        let url = self.url(service, "/")?;
        let body = serde_json::to_vec(request)
            .map_err(|e| TaskError::validation("request", e.to_string()))?;
        self.signed_send(service, Method::POST, url, body, content_type, Some(target))
            .await
    }

    async fn iam_call(&self, params: &[(&str, &str)]) -> TaskResult<()> {
        let body = {
            let mut form = url::form_urlencoded::Serializer::new(String::new());
            for (name, value) in params {
                form.append_pair(name, value);
            }
            form.finish().into_bytes()
        };
        let url = self.url("iam", "/")?;
        self.signed_send("iam", Method::POST, url, body, IAM_FORM, None)
            .await?;
        Ok(())
    }

    async fn signed_send(
        &self,
        service: &'static str,
        method: Method,
        url: Url,
        body: Vec<u8>,
        content_type: &'static str,
        target: Option<&str>,
    ) -> TaskResult<reqwest::Response> {
        // IAM is a global service pinned to us-east-1 for signing.
        let region = if service == "iam" {
            "us-east-1"
        } else {
            self.region.as_str()
        };
        let signed_headers = sign_request(
            &self.credentials,
            region,
            service,
            method.as_str(),
            &url,
            &body,
            Utc::now(),
        );

        let mut request = self
            .http
            .request(method, url)
            .header("content-type", content_type);
        if let Some(target) = target {
            request = request.header("x-amz-target", target);
        }
        for (name, value) in &signed_headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request
            .body(body)
            .send()
            .await
            .map_err(|e| TaskError::transport(service, e))?;
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<AwsErrorBody>(&text)
            .ok()
            .and_then(|b| b.message.or(b.error_type))
            .unwrap_or(text);
        tracing::warn!(service, status, message = %message, "backend rejected request");
        Err(TaskError::api(service, status, message))
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        &self,
        service: &'static str,
        response: reqwest::Response,
    ) -> TaskResult<T> {
        response
            .json::<T>()
            .await
            .map_err(|e| TaskError::transport(service, e))
    }
}
