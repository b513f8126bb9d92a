//! SQS, EventBridge, and Lambda wire types.
//!
//! SQS speaks `x-amz-json-1.0`, EventBridge `x-amz-json-1.1`, Lambda plain
//! REST; all three use PascalCase members.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// --- SQS ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SendMessageRequest {
    pub queue_url: String,
    pub message_body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay_seconds: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SendMessageResponse {
    #[serde(default)]
    pub message_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateQueueRequest {
    pub queue_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateQueueResponse {
    pub queue_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetQueueAttributesRequest {
    pub queue_url: String,
    pub attribute_names: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetQueueAttributesResponse {
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReceiveMessageRequest {
    pub queue_url: String,
    pub max_number_of_messages: u32,
    pub wait_time_seconds: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReceiveMessageResponse {
    #[serde(default)]
    pub messages: Vec<SqsMessage>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SqsMessage {
    #[serde(default)]
    pub message_id: String,
    pub receipt_handle: String,
    pub body: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteMessageRequest {
    pub queue_url: String,
    pub receipt_handle: String,
}

// --- EventBridge ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PutRuleRequest {
    pub name: String,
    pub schedule_expression: String,
    pub state: String,
    pub description: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PutRuleResponse {
    #[serde(default)]
    pub rule_arn: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PutTargetsRequest {
    pub rule: String,
    pub targets: Vec<RuleTarget>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RuleTarget {
    pub id: String,
    pub arn: String,
    /// JSON document handed to the target verbatim at trigger time.
    pub input: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PutTargetsResponse {
    #[serde(default)]
    pub failed_entry_count: i32,
}

// --- Lambda ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateFunctionRequest {
    pub function_name: String,
    pub runtime: String,
    pub role: String,
    pub handler: String,
    pub code: FunctionCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<Environment>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct FunctionCode {
    /// Base64 of the packaged deployment archive.
    pub zip_file: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Environment {
    pub variables: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FunctionConfiguration {
    #[serde(default)]
    pub function_arn: String,
    #[serde(default)]
    pub function_name: String,
}

/// GetFunction wraps the configuration; CreateFunction returns it bare.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetFunctionResponse {
    pub configuration: FunctionConfiguration,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateEventSourceMappingRequest {
    pub event_source_arn: String,
    pub function_name: String,
    pub enabled: bool,
    pub batch_size: u32,
}

// --- Errors ---

/// Error body shared by the JSON protocols; members vary by service.
#[derive(Debug, Deserialize)]
pub struct AwsErrorBody {
    #[serde(rename = "__type", default)]
    pub error_type: Option<String>,
    #[serde(rename = "message", alias = "Message", default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_message_serializes_pascal_case() {
        let request = SendMessageRequest {
            queue_url: "https://sqs.us-east-1.amazonaws.com/123/q".to_string(),
            message_body: "{}".to_string(),
            delay_seconds: Some(30),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["QueueUrl"], "https://sqs.us-east-1.amazonaws.com/123/q");
        assert_eq!(value["DelaySeconds"], 30);
    }

    #[test]
    fn error_body_accepts_both_casings() {
        let lower: AwsErrorBody =
            serde_json::from_str(r#"{"__type": "QueueDoesNotExist", "message": "no queue"}"#)
                .unwrap();
        assert_eq!(lower.message.as_deref(), Some("no queue"));

        let upper: AwsErrorBody = serde_json::from_str(r#"{"Message": "denied"}"#).unwrap();
        assert_eq!(upper.message.as_deref(), Some("denied"));
    }

    #[test]
    fn receive_message_defaults_to_empty() {
        let response: ReceiveMessageResponse = serde_json::from_str("{}").unwrap();
        assert!(response.messages.is_empty());
    }
}
