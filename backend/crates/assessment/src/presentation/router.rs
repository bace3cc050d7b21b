//! Assessment Router

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

use crate::application::config::WebhookConfig;
use crate::application::webhook_service::WebhookService;
use crate::domain::transport::WebhookTransport;
use crate::infra::http::ReqwestTransport;
use crate::presentation::handlers::{self, AssessmentAppState};

/// Create the assessment router backed by `reqwest`
pub fn assessment_router(transport: ReqwestTransport, config: WebhookConfig) -> Router {
    let service = WebhookService::new(Arc::new(transport), Arc::new(config));
    assessment_router_generic(Arc::new(service))
}

/// Create a generic assessment router for any transport implementation
pub fn assessment_router_generic<T>(service: Arc<WebhookService<T>>) -> Router
where
    T: WebhookTransport + Send + Sync + 'static,
{
    let state = AssessmentAppState { service };

    Router::new()
        .route(
            "/assessments/generate",
            post(handlers::generate_assessment::<T>),
        )
        .route("/templates", get(handlers::fetch_templates::<T>))
        .route("/status", get(handlers::service_status::<T>))
        .route("/cache/clear", post(handlers::clear_cache::<T>))
        .route("/rate-limit/reset", post(handlers::reset_rate_limit::<T>))
        .with_state(state)
}
