//! API DTOs (Data Transfer Objects)

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::generate_assessment::{GenerationFailure, GenerationOutcome};
use crate::application::progress::{GenerationStep, StepId};
use crate::domain::entities::Assessment;
use crate::domain::value_objects::DebugInfo;

/// Response for POST /assessments/generate
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub assessment: Assessment,
    pub debug_info: DebugInfo,
    pub steps: Vec<GenerationStep>,
}

impl From<GenerationOutcome> for GenerateResponse {
    fn from(outcome: GenerationOutcome) -> Self {
        Self {
            assessment: outcome.assessment,
            debug_info: outcome.debug_info,
            steps: outcome.steps,
        }
    }
}

/// Error body for POST /assessments/generate
///
/// RFC 7807 fields plus the progress state at the point of failure.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationFailureResponse {
    #[serde(rename = "type")]
    pub type_uri: String,
    pub title: &'static str,
    pub status: u16,
    pub detail: String,
    pub transient: bool,
    pub failed_step: StepId,
    pub steps: Vec<GenerationStep>,
}

impl From<GenerationFailure> for GenerationFailureResponse {
    fn from(failure: GenerationFailure) -> Self {
        let kind = failure.error.kind();
        Self {
            type_uri: format!("https://httpstatuses.io/{}", kind.status_code()),
            title: failure.error.title(),
            status: kind.status_code(),
            detail: failure.error.to_string(),
            transient: kind.is_transient(),
            failed_step: failure.failed_step,
            steps: failure.steps,
        }
    }
}

impl IntoResponse for GenerationFailure {
    fn into_response(self) -> Response {
        self.error.log();
        let body = GenerationFailureResponse::from(self);
        let status =
            StatusCode::from_u16(body.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(body)).into_response()
    }
}
