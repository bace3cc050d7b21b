//! Generate Assessment Use Case
//!
//! Runs validation, preparation, sending, processing and finalizing in
//! order. The first failing step is marked `error` and nothing after it runs.
//! There is no retry here; callers re-invoke.

use std::sync::Arc;
use std::time::Instant;

use serde_json::{Value, json};

use crate::application::progress::{
    GenerationProgress, GenerationStep, ProgressListener, StepId,
};
use crate::application::webhook_service::WebhookService;
use crate::domain::entities::Assessment;
use crate::domain::normalizer::parse_assessment;
use crate::domain::transport::WebhookTransport;
use crate::domain::value_objects::{DebugInfo, FormValues};
use crate::error::GenerationError;

/// Action sent with every generation request
pub const GENERATE_ACTION: &str = "generate_assessment";

/// Successful run
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub assessment: Assessment,
    pub debug_info: DebugInfo,
    pub steps: Vec<GenerationStep>,
}

/// Failed run, with the step that failed
#[derive(Debug, Clone)]
pub struct GenerationFailure {
    pub failed_step: StepId,
    pub error: GenerationError,
    pub steps: Vec<GenerationStep>,
}

impl std::fmt::Display for GenerationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} step failed: {}", self.failed_step, self.error)
    }
}

impl std::error::Error for GenerationFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Generate Assessment Use Case
pub struct GenerateAssessmentUseCase<T>
where
    T: WebhookTransport,
{
    service: Arc<WebhookService<T>>,
    listener: Option<Arc<dyn ProgressListener>>,
}

impl<T> GenerateAssessmentUseCase<T>
where
    T: WebhookTransport,
{
    pub fn new(service: Arc<WebhookService<T>>) -> Self {
        Self {
            service,
            listener: None,
        }
    }

    /// Notify `listener` after every step transition
    pub fn with_listener(mut self, listener: Arc<dyn ProgressListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    pub async fn execute(&self, form: FormValues) -> Result<GenerationOutcome, GenerationFailure> {
        let started = Instant::now();
        let mut progress = GenerationProgress::new();

        self.begin(&mut progress, StepId::Validation);
        if let Err(e) = form.validate() {
            return Err(self.fail(progress, StepId::Validation, e));
        }
        self.finish(&mut progress, StepId::Validation);

        self.begin(&mut progress, StepId::Preparation);
        let payload = match build_payload(&form) {
            Ok(payload) => payload,
            Err(e) => return Err(self.fail(progress, StepId::Preparation, e)),
        };
        self.finish(&mut progress, StepId::Preparation);

        self.begin(&mut progress, StepId::Sending);
        let url = self.service.config().webhook_url.clone();
        let response = match self.service.send_data(&url, payload).await {
            Ok(response) => response,
            Err(e) => return Err(self.fail(progress, StepId::Sending, e)),
        };
        self.finish(&mut progress, StepId::Sending);

        self.begin(&mut progress, StepId::Processing);
        let parsed = match parse_assessment(&response.body, &form, self.service.now()) {
            Ok(parsed) => parsed,
            Err(e) => return Err(self.fail(progress, StepId::Processing, e)),
        };
        self.finish(&mut progress, StepId::Processing);

        self.begin(&mut progress, StepId::Finalizing);
        self.finish(&mut progress, StepId::Finalizing);

        tracing::info!(
            questions = parsed.assessment.questoes.len(),
            shape = ?parsed.debug_info.detected_shape,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Assessment generated"
        );

        Ok(GenerationOutcome {
            assessment: parsed.assessment,
            debug_info: parsed.debug_info,
            steps: progress.into_steps(),
        })
    }

    fn begin(&self, progress: &mut GenerationProgress, step: StepId) {
        progress.start(step);
        tracing::debug!(step = %step, "Generation step started");
        self.notify(progress);
    }

    fn finish(&self, progress: &mut GenerationProgress, step: StepId) {
        progress.complete(step);
        self.notify(progress);
    }

    fn fail(
        &self,
        mut progress: GenerationProgress,
        step: StepId,
        error: impl Into<GenerationError>,
    ) -> GenerationFailure {
        let error = error.into();
        progress.fail(step);
        tracing::warn!(step = %step, error = %error, "Generation step failed");
        self.notify(&progress);

        GenerationFailure {
            failed_step: step,
            error,
            steps: progress.into_steps(),
        }
    }

    fn notify(&self, progress: &GenerationProgress) {
        if let Some(listener) = &self.listener {
            listener.on_progress(progress);
        }
    }
}

/// Request body for a generation call: the form values plus the action marker
fn build_payload(form: &FormValues) -> Result<Value, GenerationError> {
    let mut payload =
        serde_json::to_value(form).map_err(|e| GenerationError::InvalidInput(e.to_string()))?;
    if let Value::Object(map) = &mut payload {
        map.insert("action".into(), json!(GENERATE_ACTION));
    }
    Ok(payload)
}
