//! Generation Progress
//!
//! Five sequential steps, each `pending -> active -> completed`, or
//! `active -> error` when the step fails. At most one step is active and no
//! step after a failure ever leaves `pending`.

use serde::Serialize;

/// Pipeline step identifiers, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepId {
    Validation,
    Preparation,
    Sending,
    Processing,
    Finalizing,
}

impl StepId {
    pub const ALL: [StepId; 5] = [
        StepId::Validation,
        StepId::Preparation,
        StepId::Sending,
        StepId::Processing,
        StepId::Finalizing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StepId::Validation => "validation",
            StepId::Preparation => "preparation",
            StepId::Sending => "sending",
            StepId::Processing => "processing",
            StepId::Finalizing => "finalizing",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StepId::Validation => "Validação",
            StepId::Preparation => "Preparação",
            StepId::Sending => "Envio",
            StepId::Processing => "Processamento",
            StepId::Finalizing => "Finalização",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            StepId::Validation => "Validando os dados do formulário",
            StepId::Preparation => "Preparando a solicitação",
            StepId::Sending => "Enviando para o gerador de avaliações",
            StepId::Processing => "Processando a resposta",
            StepId::Finalizing => "Finalizando a avaliação",
        }
    }
}

impl std::fmt::Display for StepId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Active,
    Completed,
    Error,
}

/// One step as shown to the progress UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationStep {
    pub id: StepId,
    pub label: &'static str,
    pub status: StepStatus,
    pub description: &'static str,
}

/// Snapshot of all five steps
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct GenerationProgress {
    steps: Vec<GenerationStep>,
}

impl Default for GenerationProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl GenerationProgress {
    /// All steps pending
    pub fn new() -> Self {
        let steps = StepId::ALL
            .into_iter()
            .map(|id| GenerationStep {
                id,
                label: id.label(),
                status: StepStatus::Pending,
                description: id.description(),
            })
            .collect();
        Self { steps }
    }

    pub fn steps(&self) -> &[GenerationStep] {
        &self.steps
    }

    pub fn into_steps(self) -> Vec<GenerationStep> {
        self.steps
    }

    pub fn status_of(&self, id: StepId) -> StepStatus {
        self.steps
            .iter()
            .find(|step| step.id == id)
            .map(|step| step.status)
            .unwrap_or(StepStatus::Pending)
    }

    pub fn active_step(&self) -> Option<StepId> {
        self.steps
            .iter()
            .find(|step| step.status == StepStatus::Active)
            .map(|step| step.id)
    }

    /// Whether a step has been marked as failed
    pub fn has_error(&self) -> bool {
        self.steps.iter().any(|step| step.status == StepStatus::Error)
    }

    /// Mark `id` active, completing any step still active before it
    pub fn start(&mut self, id: StepId) {
        for step in &mut self.steps {
            if step.id == id {
                step.status = StepStatus::Active;
            } else if step.status == StepStatus::Active {
                step.status = StepStatus::Completed;
            }
        }
    }

    pub fn complete(&mut self, id: StepId) {
        self.set(id, StepStatus::Completed);
    }

    pub fn fail(&mut self, id: StepId) {
        self.set(id, StepStatus::Error);
    }

    fn set(&mut self, id: StepId, status: StepStatus) {
        if let Some(step) = self.steps.iter_mut().find(|step| step.id == id) {
            step.status = status;
        }
    }
}

/// Receives a snapshot after every step transition
pub trait ProgressListener: Send + Sync {
    fn on_progress(&self, progress: &GenerationProgress);
}

impl<F> ProgressListener for F
where
    F: Fn(&GenerationProgress) + Send + Sync,
{
    fn on_progress(&self, progress: &GenerationProgress) {
        self(progress)
    }
}
