//! Domain Entities
//!
//! The normalized assessment ("avaliação") handed to callers. Field names
//! follow the wire format produced by the generation workflow.

use serde::{Deserialize, Serialize};

/// Score label used when a question does not carry one
pub const DEFAULT_SCORE_LABEL: &str = "1,0 ponto";
/// Question type used when a question does not carry one
pub const DEFAULT_QUESTION_TYPE: &str = "multipla_escolha";
/// Correct-answer letter used when a question does not carry one
pub const DEFAULT_CORRECT_LETTER: &str = "a";

/// Instruction lines used when the response has none
pub const DEFAULT_INSTRUCTIONS: [&str; 3] = [
    "Leia atentamente cada questão antes de responder.",
    "Marque apenas uma alternativa por questão.",
    "Revise suas respostas antes de entregar a avaliação.",
];

/// A generated assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub cabecalho: AssessmentHeader,
    pub instrucoes: Vec<String>,
    pub questoes: Vec<Question>,
    pub metadata: AssessmentMetadata,
    /// Answer key, always derived from `questoes`
    pub gabarito: Vec<String>,
}

impl Assessment {
    /// Build an assessment, deriving the answer key from the questions
    pub fn new(
        cabecalho: AssessmentHeader,
        instrucoes: Vec<String>,
        questoes: Vec<Question>,
        metadata: AssessmentMetadata,
    ) -> Self {
        let gabarito = answer_key(&questoes);
        Self {
            cabecalho,
            instrucoes,
            questoes,
            metadata,
            gabarito,
        }
    }
}

/// Header block printed at the top of the assessment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentHeader {
    pub disciplina: String,
    pub unidade: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capitulo: Option<String>,
    pub tema: String,
    pub duracao: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// 1-based position
    pub numero: u32,
    pub pontuacao: String,
    pub enunciado: String,
    pub tipo: String,
    pub alternativas: Vec<Alternative>,
    pub resposta_correta: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alternative {
    pub letra: String,
    pub texto: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentMetadata {
    pub total_questoes: usize,
    pub nivel_dificuldade: u8,
    pub estilo: String,
    pub permite_calculadora: bool,
    /// Minutes
    pub tempo_total: u32,
    /// ISO-8601
    pub data_criacao: String,
}

/// `"Questão N: LETTER"` for every question, in order
pub fn answer_key(questoes: &[Question]) -> Vec<String> {
    questoes
        .iter()
        .map(|q| format!("Questão {}: {}", q.numero, q.resposta_correta.to_uppercase()))
        .collect()
}
