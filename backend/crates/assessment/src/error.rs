//! Assessment Error Types
//!
//! Layered error variants for the webhook client, the response parser and
//! the generation orchestrator. All of them integrate with the unified
//! `kernel::error::AppError` system.

use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use platform::rate_limit::RateLimitError;
use serde_json::Value;
use thiserror::Error;

/// Longest raw-response excerpt embedded in an error message
const RAW_EXCERPT_LEN: usize = 500;

pub type WebhookResult<T> = Result<T, WebhookError>;
pub type ParseResult<T> = Result<T, ParseError>;
pub type GenerationResult<T> = Result<T, GenerationError>;

/// Failures of the outbound webhook call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WebhookError {
    /// URL missing, unparseable or not http(s)
    #[error("Invalid webhook URL: {0}")]
    InvalidUrl(String),

    /// Payload is not a non-empty JSON object
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Attempt came before the backoff window elapsed
    #[error("Too many requests. Wait {retry_after_secs} seconds before trying again")]
    RateLimited { retry_after_secs: i64 },

    /// Client-side hard block is active
    #[error("Service temporarily blocked. Try again in {retry_after_secs} seconds")]
    Blocked { retry_after_secs: i64 },

    /// Request aborted after the configured timeout
    #[error("Webhook did not respond within {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    /// No response at all (DNS, refused connection, TLS, ...)
    #[error("Could not connect to the webhook: {0}")]
    Connection(String),

    /// HTTP 5xx
    #[error("Webhook server error (HTTP {status})")]
    Server { status: u16 },

    /// HTTP 404
    #[error("Webhook endpoint not found (HTTP 404)")]
    NotFound,

    /// HTTP 429
    #[error("Webhook is throttling requests (HTTP 429)")]
    Throttled,

    /// Any other non-2xx status
    #[error("Webhook request failed (HTTP {status})")]
    Http { status: u16 },

    /// 2xx response that is not JSON
    #[error("Invalid response format: {0}")]
    InvalidResponseFormat(String),
}

impl WebhookError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WebhookError::InvalidUrl(_) | WebhookError::InvalidPayload(_) => ErrorKind::BadRequest,
            WebhookError::RateLimited { .. } | WebhookError::Throttled => {
                ErrorKind::TooManyRequests
            }
            WebhookError::Blocked { .. } => ErrorKind::ServiceUnavailable,
            WebhookError::Timeout { .. } => ErrorKind::GatewayTimeout,
            WebhookError::NotFound => ErrorKind::NotFound,
            WebhookError::Connection(_)
            | WebhookError::Server { .. }
            | WebhookError::Http { .. }
            | WebhookError::InvalidResponseFormat(_) => ErrorKind::BadGateway,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            WebhookError::InvalidUrl(_) => "Invalid webhook URL",
            WebhookError::InvalidPayload(_) => "Invalid request",
            WebhookError::RateLimited { .. } => "Too many requests",
            WebhookError::Blocked { .. } => "Service temporarily blocked",
            WebhookError::Timeout { .. } => "Request timed out",
            WebhookError::Connection(_) => "Connection error",
            WebhookError::Server { .. } => "Server error",
            WebhookError::NotFound => "Webhook not found",
            WebhookError::Throttled => "Webhook throttled",
            WebhookError::Http { .. } => "Request failed",
            WebhookError::InvalidResponseFormat(_) => "Invalid response format",
        }
    }
}

impl From<RateLimitError> for WebhookError {
    fn from(err: RateLimitError) -> Self {
        let retry_after_secs = err.retry_after_secs();
        match err {
            RateLimitError::TooSoon { .. } => WebhookError::RateLimited { retry_after_secs },
            RateLimitError::Blocked { .. } => WebhookError::Blocked { retry_after_secs },
        }
    }
}

/// Failures while turning a raw response into an assessment
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// None of the known envelope shapes matched
    #[error("Invalid response structure: {}", excerpt(.raw))]
    InvalidResponseStructure { raw: Value },

    /// The extracted payload is not valid JSON
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// Decoded payload violates the assessment schema
    #[error("{}", validation_message(*.question, .message))]
    Validation {
        /// 1-based question index, when the problem is inside a question
        question: Option<usize>,
        message: String,
    },
}

impl ParseError {
    pub fn validation(message: impl Into<String>) -> Self {
        ParseError::Validation {
            question: None,
            message: message.into(),
        }
    }

    pub fn question(index: usize, message: impl Into<String>) -> Self {
        ParseError::Validation {
            question: Some(index + 1),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ParseError::InvalidResponseStructure { .. } | ParseError::MalformedPayload(_) => {
                ErrorKind::BadGateway
            }
            ParseError::Validation { .. } => ErrorKind::UnprocessableEntity,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ParseError::InvalidResponseStructure { .. } => "Unexpected response structure",
            ParseError::MalformedPayload(_) => "Malformed response payload",
            ParseError::Validation { .. } => "Invalid assessment",
        }
    }
}

fn excerpt(raw: &Value) -> String {
    let text = raw.to_string();
    match text.char_indices().nth(RAW_EXCERPT_LEN) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text,
    }
}

fn validation_message(question: Option<usize>, message: &str) -> String {
    match question {
        Some(index) => format!("Validation error in question {index}: {message}"),
        None => format!("Validation error: {message}"),
    }
}

/// Failures surfaced by the generation orchestrator
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenerationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Webhook(#[from] WebhookError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl GenerationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GenerationError::InvalidInput(_) => ErrorKind::BadRequest,
            GenerationError::Webhook(e) => e.kind(),
            GenerationError::Parse(e) => e.kind(),
        }
    }

    /// Short user-facing title
    pub fn title(&self) -> &'static str {
        match self {
            GenerationError::InvalidInput(_) => "Invalid form data",
            GenerationError::Webhook(e) => e.title(),
            GenerationError::Parse(e) => e.title(),
        }
    }

    /// Log the error with appropriate level
    pub(crate) fn log(&self) {
        match self {
            GenerationError::Webhook(
                e @ (WebhookError::RateLimited { .. }
                | WebhookError::Blocked { .. }
                | WebhookError::Throttled),
            ) => {
                tracing::warn!(error = %e, "Webhook throttled");
            }
            GenerationError::Webhook(e) if e.kind().is_server_error() => {
                tracing::error!(error = %e, "Webhook failure");
            }
            GenerationError::Parse(e) => {
                tracing::error!(error = %e, "Assessment parse failure");
            }
            _ => {
                tracing::debug!(error = %self, "Generation error");
            }
        }
    }
}

impl From<WebhookError> for AppError {
    fn from(err: WebhookError) -> Self {
        GenerationError::from(err).into()
    }
}

impl From<GenerationError> for AppError {
    fn from(err: GenerationError) -> Self {
        let kind = err.kind();
        let app_error = AppError::new(kind, err.to_string()).with_source(err);
        if kind.is_transient() {
            app_error.with_action("Please try again in a moment")
        } else {
            app_error
        }
    }
}

impl IntoResponse for GenerationError {
    fn into_response(self) -> Response {
        self.log();
        AppError::from(self).into_response()
    }
}
