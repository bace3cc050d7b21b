//! Assessment Generation Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Assessment model, envelope detection, normalizer, transport trait
//! - `application/` - Webhook service and the generation use case
//! - `infra/` - `reqwest` transport
//! - `presentation/` - HTTP handlers
//!
//! ## Request Model
//! - The workflow endpoint is an external shared resource; the client protects
//!   it with its own exponential backoff and a hard block, never with sleeps
//! - Read-only actions are cached briefly; generation requests never are
//! - Responses are never trusted as-is: the envelope is detected, the payload
//!   validated, and the answer key recomputed

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::{ConfigError, WebhookConfig};
pub use application::generate_assessment::{
    GenerateAssessmentUseCase, GenerationFailure, GenerationOutcome,
};
pub use application::webhook_service::{ServiceStatus, WebhookService};
pub use error::{GenerationError, ParseError, WebhookError};
pub use infra::http::ReqwestTransport;
pub use presentation::router::{assessment_router, assessment_router_generic};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};
