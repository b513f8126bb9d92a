//! AWS backend family: no native delayed-HTTP primitive exists, so delivery
//! is composed from SQS (per-message delay), a relay Lambda that replays
//! queued messages as HTTP calls, and EventBridge rules for cron triggers.

pub mod api;
pub mod client;
pub mod delayer;
pub mod provision;
pub mod scheduler;
pub mod sign;

pub use client::AwsApiClient;
pub use delayer::SqsDelayer;
pub use scheduler::EventBridgeScheduler;
