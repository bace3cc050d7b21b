//! Webhook Transport Trait
//!
//! Interface for the outbound HTTP call. Implementation is in the infra layer.

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

/// Response as seen on the wire, before any classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Whether the `Content-Type` header announces JSON
    pub fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("application/json"))
    }
}

/// Failures that happen before any response arrives
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("{0}")]
    Connection(String),
}

/// Outbound JSON POST
#[trait_variant::make(WebhookTransport: Send)]
pub trait LocalWebhookTransport {
    /// POST `body` as JSON to `url`, aborting after `timeout`
    async fn post_json(
        &self,
        url: &str,
        body: &Value,
        timeout: Duration,
    ) -> Result<TransportResponse, TransportError>;
}
