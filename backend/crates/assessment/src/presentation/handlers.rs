//! HTTP Handlers

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use crate::application::generate_assessment::{GenerateAssessmentUseCase, GenerationFailure};
use crate::application::webhook_service::{ServiceStatus, WebhookService};
use crate::domain::transport::WebhookTransport;
use crate::domain::value_objects::{FormValues, WebhookResponse};
use crate::error::GenerationResult;
use crate::presentation::dto::GenerateResponse;

/// Shared state for assessment handlers
pub struct AssessmentAppState<T>
where
    T: WebhookTransport + Send + Sync + 'static,
{
    pub service: Arc<WebhookService<T>>,
}

impl<T> Clone for AssessmentAppState<T>
where
    T: WebhookTransport + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
        }
    }
}

/// POST /assessments/generate
pub async fn generate_assessment<T>(
    State(state): State<AssessmentAppState<T>>,
    Json(form): Json<FormValues>,
) -> Result<Json<GenerateResponse>, GenerationFailure>
where
    T: WebhookTransport + Send + Sync + 'static,
{
    let use_case = GenerateAssessmentUseCase::new(state.service.clone());
    let outcome = use_case.execute(form).await?;
    Ok(Json(outcome.into()))
}

/// GET /templates
pub async fn fetch_templates<T>(
    State(state): State<AssessmentAppState<T>>,
) -> GenerationResult<Json<WebhookResponse>>
where
    T: WebhookTransport + Send + Sync + 'static,
{
    let response = state.service.fetch_templates().await?;
    Ok(Json(response))
}

/// GET /status
pub async fn service_status<T>(State(state): State<AssessmentAppState<T>>) -> Json<ServiceStatus>
where
    T: WebhookTransport + Send + Sync + 'static,
{
    Json(state.service.service_status())
}

/// POST /cache/clear
pub async fn clear_cache<T>(State(state): State<AssessmentAppState<T>>) -> StatusCode
where
    T: WebhookTransport + Send + Sync + 'static,
{
    state.service.clear_cache();
    StatusCode::NO_CONTENT
}

/// POST /rate-limit/reset
pub async fn reset_rate_limit<T>(State(state): State<AssessmentAppState<T>>) -> StatusCode
where
    T: WebhookTransport + Send + Sync + 'static,
{
    state.service.reset_request_count();
    StatusCode::NO_CONTENT
}
