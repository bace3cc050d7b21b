//! Domain Value Objects
//!
//! Immutable value types for the generation pipeline.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::GenerationError;

pub const MIN_QUESTIONS: u32 = 1;
pub const MAX_QUESTIONS: u32 = 50;
pub const MIN_DIFFICULTY: u8 = 1;
pub const MAX_DIFFICULTY: u8 = 10;
pub const MAX_TOTAL_MINUTES: u32 = 600;

fn default_question_count() -> u32 {
    10
}

/// Values submitted by the assessment form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormValues {
    pub disciplina: String,
    pub unidade: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capitulo: Option<String>,
    pub tema: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duracao: Option<String>,
    #[serde(default = "default_question_count")]
    pub quantidade_questoes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nivel_dificuldade: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estilo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permite_calculadora: Option<bool>,
    /// Minutes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tempo_total: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observacoes: Option<String>,
}

impl FormValues {
    /// Check required fields and numeric ranges
    pub fn validate(&self) -> Result<(), GenerationError> {
        let required = [
            ("disciplina", &self.disciplina),
            ("unidade", &self.unidade),
            ("tema", &self.tema),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(GenerationError::InvalidInput(format!(
                    "Field '{name}' is required"
                )));
            }
        }

        if !(MIN_QUESTIONS..=MAX_QUESTIONS).contains(&self.quantidade_questoes) {
            return Err(GenerationError::InvalidInput(format!(
                "Question count must be between {MIN_QUESTIONS} and {MAX_QUESTIONS} (got {})",
                self.quantidade_questoes
            )));
        }

        if let Some(level) = self.nivel_dificuldade {
            if !(MIN_DIFFICULTY..=MAX_DIFFICULTY).contains(&level) {
                return Err(GenerationError::InvalidInput(format!(
                    "Difficulty must be between {MIN_DIFFICULTY} and {MAX_DIFFICULTY} (got {level})"
                )));
            }
        }

        if let Some(minutes) = self.tempo_total {
            if minutes == 0 || minutes > MAX_TOTAL_MINUTES {
                return Err(GenerationError::InvalidInput(format!(
                    "Total time must be between 1 and {MAX_TOTAL_MINUTES} minutes (got {minutes})"
                )));
            }
        }

        Ok(())
    }
}

/// Result of a webhook round trip, or a cache hit
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookResponse {
    pub success: bool,
    pub from_cache: bool,
    /// Raw envelope as returned by the workflow
    pub body: Value,
}

/// Envelope shapes the workflow has been observed to return
///
/// Declaration order is the probe priority: the first matching shape wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseShape {
    /// `[{"output": ...}]`
    ArrayOutput,
    /// `{"success": ..., "data": [{"output": ...}]}`
    SuccessDataArray,
    /// `{"output": ...}`
    TopLevelOutput,
    /// `{"data": {"output": ...}}`
    DataOutput,
    /// `{"0": {"output": ...}}`
    IndexedOutput,
    /// `"..."`
    BareString,
    /// `{"avaliacao": ...}`
    AvaliacaoField,
}

impl ResponseShape {
    pub const PRIORITY: [ResponseShape; 7] = [
        ResponseShape::ArrayOutput,
        ResponseShape::SuccessDataArray,
        ResponseShape::TopLevelOutput,
        ResponseShape::DataOutput,
        ResponseShape::IndexedOutput,
        ResponseShape::BareString,
        ResponseShape::AvaliacaoField,
    ];
}

/// Diagnostics returned alongside a parsed assessment
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugInfo {
    pub raw_response: Value,
    pub detected_shape: Option<ResponseShape>,
    pub response_type: &'static str,
    pub is_array: bool,
    pub top_level_keys: Vec<String>,
}

impl DebugInfo {
    pub fn describe(raw: &Value, detected_shape: Option<ResponseShape>) -> Self {
        let response_type = match raw {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        };
        let top_level_keys = raw
            .as_object()
            .map(|map| map.keys().cloned().collect())
            .unwrap_or_default();

        Self {
            raw_response: raw.clone(),
            detected_shape,
            response_type,
            is_array: raw.is_array(),
            top_level_keys,
        }
    }
}
