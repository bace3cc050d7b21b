//! Assessment Normalizer
//!
//! Turns a raw webhook response into a validated [`Assessment`].
//!
//! ## Rules
//! - `questoes` must be a non-empty list; every question needs a non-empty
//!   `enunciado` and a non-empty `alternativas` list. Violations are errors,
//!   a question is never dropped.
//! - Optional fields that are *absent* (missing, `null` or blank) receive a
//!   default from the form values or a fixed fallback. Optional fields that are
//!   *present with the wrong type* are validation errors.
//! - `instrucoes` is lenient: anything other than a list of strings falls back
//!   to the default instructions.
//! - `gabarito` is recomputed from the final question list; any answer key in
//!   the response is ignored.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

use crate::domain::entities::{
    Alternative, Assessment, AssessmentHeader, AssessmentMetadata, DEFAULT_CORRECT_LETTER,
    DEFAULT_INSTRUCTIONS, DEFAULT_QUESTION_TYPE, DEFAULT_SCORE_LABEL, Question,
};
use crate::domain::envelope::{decode_payload, detect_payload};
use crate::domain::value_objects::{DebugInfo, FormValues};
use crate::error::{ParseError, ParseResult};

/// Header value used when neither the response nor the form has one
pub const PLACEHOLDER: &str = "Não informado";
pub const DEFAULT_DIFFICULTY: u8 = 5;
pub const DEFAULT_STYLE: &str = "conceitual";
pub const DEFAULT_TOTAL_MINUTES: u32 = 60;

/// Normalized assessment plus diagnostics about the raw response
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedAssessment {
    pub assessment: Assessment,
    pub debug_info: DebugInfo,
}

/// Parse and validate a raw webhook response
///
/// ## Arguments
/// * `raw` - Response body exactly as received
/// * `form` - Values the request was generated from (source of defaults)
/// * `now` - Creation timestamp used when the response carries none
pub fn parse_assessment(
    raw: &Value,
    form: &FormValues,
    now: DateTime<Utc>,
) -> ParseResult<ParsedAssessment> {
    let detected = detect_payload(raw).ok_or_else(|| ParseError::InvalidResponseStructure {
        raw: raw.clone(),
    })?;

    tracing::debug!(shape = ?detected.shape, "Detected response shape");

    let decoded = decode_payload(detected.payload)?;
    let assessment = normalize(&decoded, form, now)?;

    Ok(ParsedAssessment {
        assessment,
        debug_info: DebugInfo::describe(raw, Some(detected.shape)),
    })
}

/// Validate a decoded payload and fill in defaults
pub fn normalize(decoded: &Value, form: &FormValues, now: DateTime<Utc>) -> ParseResult<Assessment> {
    let root = unwrap_avaliacao(decoded)?;
    let root = root
        .as_object()
        .ok_or_else(|| ParseError::validation("payload is not a JSON object"))?;

    let questoes = parse_questions(root)?;
    let cabecalho = parse_header(root, form)?;
    let instrucoes = parse_instructions(root);
    let metadata = parse_metadata(root, form, questoes.len(), now)?;

    Ok(Assessment::new(cabecalho, instrucoes, questoes, metadata))
}

/// Descend into an `avaliacao` wrapper when the payload has no questions of its own
fn unwrap_avaliacao(decoded: &Value) -> ParseResult<Value> {
    match decoded.get("avaliacao") {
        Some(inner) if decoded.get("questoes").is_none() && !inner.is_null() => decode_payload(inner),
        _ => Ok(decoded.clone()),
    }
}

fn parse_questions(root: &Map<String, Value>) -> ParseResult<Vec<Question>> {
    let items = match root.get("questoes") {
        None | Some(Value::Null) => return Err(ParseError::validation("missing 'questoes'")),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(ParseError::validation("'questoes' must be a list")),
    };
    if items.is_empty() {
        return Err(ParseError::validation("'questoes' is empty"));
    }

    items
        .iter()
        .enumerate()
        .map(|(index, item)| parse_question(index, item))
        .collect()
}

fn parse_question(index: usize, item: &Value) -> ParseResult<Question> {
    let obj = item
        .as_object()
        .ok_or_else(|| ParseError::question(index, "question is not an object"))?;
    let fields = Fields::question(obj, index);

    let enunciado = fields
        .text("enunciado")?
        .ok_or_else(|| ParseError::question(index, "missing 'enunciado'"))?;

    let alternativas = match obj.get("alternativas") {
        None | Some(Value::Null) => {
            return Err(ParseError::question(index, "missing 'alternativas'"));
        }
        Some(Value::Array(items)) if items.is_empty() => {
            return Err(ParseError::question(index, "'alternativas' is empty"));
        }
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(position, alt)| parse_alternative(index, position, alt))
            .collect::<ParseResult<Vec<_>>>()?,
        Some(_) => return Err(ParseError::question(index, "'alternativas' must be a list")),
    };

    let numero = fields.number("numero")?.unwrap_or(index as u32 + 1);
    let resposta_correta = fields
        .text("resposta_correta")?
        .map(|letter| letter.to_lowercase())
        .unwrap_or_else(|| DEFAULT_CORRECT_LETTER.to_string());

    Ok(Question {
        numero,
        pontuacao: fields
            .text("pontuacao")?
            .unwrap_or_else(|| DEFAULT_SCORE_LABEL.to_string()),
        enunciado,
        tipo: fields
            .text("tipo")?
            .unwrap_or_else(|| DEFAULT_QUESTION_TYPE.to_string()),
        alternativas,
        resposta_correta,
    })
}

fn parse_alternative(question: usize, position: usize, item: &Value) -> ParseResult<Alternative> {
    let positional = || position_letter(position);
    match item {
        Value::String(texto) => Ok(Alternative {
            letra: positional(),
            texto: texto.clone(),
        }),
        Value::Object(obj) => {
            let fields = Fields::question(obj, question);
            let texto = fields.text("texto")?.ok_or_else(|| {
                ParseError::question(question, format!("alternative {} has no 'texto'", position + 1))
            })?;
            Ok(Alternative {
                letra: fields
                    .text("letra")?
                    .map(|letter| letter.to_lowercase())
                    .unwrap_or_else(positional),
                texto,
            })
        }
        _ => Err(ParseError::question(
            question,
            format!("alternative {} must be an object or a string", position + 1),
        )),
    }
}

/// `a`, `b`, ... `z`, then `a27`-style labels past the alphabet
fn position_letter(position: usize) -> String {
    match u8::try_from(position) {
        Ok(offset) if offset < 26 => char::from(b'a' + offset).to_string(),
        _ => format!("a{}", position + 1),
    }
}

fn parse_header(root: &Map<String, Value>, form: &FormValues) -> ParseResult<AssessmentHeader> {
    let empty = Map::new();
    let obj = section(root, "cabecalho")?.unwrap_or(&empty);
    let fields = Fields::section(obj, "cabecalho");

    let or_form = |value: Option<String>, fallback: &str| {
        value
            .or_else(|| non_blank(fallback))
            .unwrap_or_else(|| PLACEHOLDER.to_string())
    };

    Ok(AssessmentHeader {
        disciplina: or_form(fields.text("disciplina")?, form.disciplina.as_str()),
        unidade: or_form(fields.text("unidade")?, form.unidade.as_str()),
        capitulo: fields
            .text("capitulo")?
            .or_else(|| form.capitulo.as_deref().and_then(non_blank)),
        tema: or_form(fields.text("tema")?, form.tema.as_str()),
        duracao: or_form(fields.text("duracao")?, form.duracao.as_deref().unwrap_or_default()),
    })
}

fn parse_instructions(root: &Map<String, Value>) -> Vec<String> {
    let parsed = root.get("instrucoes").and_then(Value::as_array).and_then(|items| {
        items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect::<Option<Vec<_>>>()
    });

    match parsed {
        Some(lines) if !lines.is_empty() => lines,
        _ => DEFAULT_INSTRUCTIONS.iter().map(|s| s.to_string()).collect(),
    }
}

fn parse_metadata(
    root: &Map<String, Value>,
    form: &FormValues,
    total_questoes: usize,
    now: DateTime<Utc>,
) -> ParseResult<AssessmentMetadata> {
    let empty = Map::new();
    let obj = section(root, "metadata")?.unwrap_or(&empty);
    let fields = Fields::section(obj, "metadata");

    let nivel_dificuldade = match fields.number("nivel_dificuldade")? {
        Some(level) => u8::try_from(level)
            .map_err(|_| ParseError::validation("'metadata.nivel_dificuldade' is out of range"))?,
        None => form.nivel_dificuldade.unwrap_or(DEFAULT_DIFFICULTY),
    };

    Ok(AssessmentMetadata {
        total_questoes,
        nivel_dificuldade,
        estilo: fields
            .text("estilo")?
            .or_else(|| form.estilo.as_deref().and_then(non_blank))
            .unwrap_or_else(|| DEFAULT_STYLE.to_string()),
        permite_calculadora: fields
            .flag("permite_calculadora")?
            .or(form.permite_calculadora)
            .unwrap_or(false),
        tempo_total: fields
            .number("tempo_total")?
            .or(form.tempo_total)
            .unwrap_or(DEFAULT_TOTAL_MINUTES),
        data_criacao: fields
            .text("data_criacao")?
            .unwrap_or_else(|| now.to_rfc3339_opts(SecondsFormat::Millis, true)),
    })
}

/// Optional nested object; present-but-not-an-object is an error
fn section<'a>(
    root: &'a Map<String, Value>,
    key: &'static str,
) -> ParseResult<Option<&'a Map<String, Value>>> {
    match root.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(obj)) => Ok(Some(obj)),
        Some(_) => Err(ParseError::validation(format!("'{key}' must be an object"))),
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Where a field lives, for error messages
#[derive(Clone, Copy)]
enum Scope {
    Question(usize),
    Section(&'static str),
}

/// Typed accessors for optional fields
///
/// Each accessor returns `Ok(None)` when the field is absent (missing, `null`
/// or blank) and an error when it is present with an unusable type.
struct Fields<'a> {
    obj: &'a Map<String, Value>,
    scope: Scope,
}

impl<'a> Fields<'a> {
    fn question(obj: &'a Map<String, Value>, index: usize) -> Self {
        Self {
            obj,
            scope: Scope::Question(index),
        }
    }

    fn section(obj: &'a Map<String, Value>, name: &'static str) -> Self {
        Self {
            obj,
            scope: Scope::Section(name),
        }
    }

    fn invalid(&self, key: &str, expected: &str) -> ParseError {
        match self.scope {
            Scope::Question(index) => {
                ParseError::question(index, format!("'{key}' must be {expected}"))
            }
            Scope::Section(name) => {
                ParseError::validation(format!("'{name}.{key}' must be {expected}"))
            }
        }
    }

    /// Strings, or numbers rendered as text
    fn text(&self, key: &str) -> ParseResult<Option<String>> {
        match self.obj.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(non_blank(s)),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(_) => Err(self.invalid(key, "a string")),
        }
    }

    /// Non-negative integers, or strings holding one
    fn number(&self, key: &str) -> ParseResult<Option<u32>> {
        let parsed = match self.obj.get(key) {
            None | Some(Value::Null) => return Ok(None),
            Some(Value::String(s)) if s.trim().is_empty() => return Ok(None),
            Some(Value::String(s)) => s.trim().parse::<u32>().ok(),
            Some(Value::Number(n)) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
            Some(_) => None,
        };
        parsed
            .map(Some)
            .ok_or_else(|| self.invalid(key, "a non-negative integer"))
    }

    /// Booleans, or the strings `"true"` / `"false"`
    fn flag(&self, key: &str) -> ParseResult<Option<bool>> {
        match self.obj.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(Value::String(s)) => match s.trim().to_lowercase().as_str() {
                "true" => Ok(Some(true)),
                "false" => Ok(Some(false)),
                "" => Ok(None),
                _ => Err(self.invalid(key, "a boolean")),
            },
            Some(_) => Err(self.invalid(key, "a boolean")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::ResponseShape;
    use chrono::TimeZone;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn form() -> FormValues {
        FormValues {
            disciplina: "Matemática".into(),
            unidade: "Unidade 3".into(),
            capitulo: Some("Capítulo 7".into()),
            tema: "Porcentagem".into(),
            duracao: Some("2 aulas".into()),
            quantidade_questoes: 2,
            nivel_dificuldade: Some(8),
            estilo: None,
            permite_calculadora: Some(true),
            tempo_total: None,
            observacoes: None,
        }
    }

    fn wrap(payload: &Value) -> Value {
        json!([{ "output": payload.to_string() }])
    }

    #[test]
    fn test_minimal_question_gets_defaults() {
        let raw = json!([{
            "output": "{\"questoes\":[{\"enunciado\":\"2+2=?\",\"alternativas\":[{\"letra\":\"a\",\"texto\":\"4\"}]}]}"
        }]);

        let parsed = parse_assessment(&raw, &form(), now()).unwrap();
        let assessment = parsed.assessment;

        assert_eq!(assessment.questoes.len(), 1);
        let q = &assessment.questoes[0];
        assert_eq!(q.numero, 1);
        assert_eq!(q.pontuacao, DEFAULT_SCORE_LABEL);
        assert_eq!(q.tipo, DEFAULT_QUESTION_TYPE);
        assert_eq!(q.resposta_correta, "a");
        assert_eq!(assessment.gabarito, vec!["Questão 1: A"]);
        assert_eq!(parsed.debug_info.detected_shape, Some(ResponseShape::ArrayOutput));
        assert!(parsed.debug_info.is_array);
    }

    #[test]
    fn test_header_and_metadata_fall_back_to_form() {
        let payload = json!({
            "questoes": [{ "enunciado": "Q", "alternativas": ["x", "y"] }]
        });
        let a = parse_assessment(&wrap(&payload), &form(), now()).unwrap().assessment;

        assert_eq!(a.cabecalho.disciplina, "Matemática");
        assert_eq!(a.cabecalho.capitulo.as_deref(), Some("Capítulo 7"));
        assert_eq!(a.cabecalho.duracao, "2 aulas");
        assert_eq!(a.metadata.nivel_dificuldade, 8);
        assert_eq!(a.metadata.estilo, DEFAULT_STYLE);
        assert!(a.metadata.permite_calculadora);
        assert_eq!(a.metadata.tempo_total, DEFAULT_TOTAL_MINUTES);
        assert_eq!(a.metadata.total_questoes, 1);
        assert_eq!(a.metadata.data_criacao, "2024-03-01T12:00:00.000Z");
        assert_eq!(a.instrucoes.len(), 3);
    }

    #[test]
    fn test_placeholders_without_form_values() {
        let mut values = form();
        values.duracao = None;
        values.capitulo = None;
        values.nivel_dificuldade = None;
        values.permite_calculadora = None;

        let payload = json!({ "questoes": [{ "enunciado": "Q", "alternativas": ["x"] }] });
        let a = parse_assessment(&wrap(&payload), &values, now()).unwrap().assessment;

        assert_eq!(a.cabecalho.duracao, PLACEHOLDER);
        assert!(a.cabecalho.capitulo.is_none());
        assert_eq!(a.metadata.nivel_dificuldade, DEFAULT_DIFFICULTY);
        assert!(!a.metadata.permite_calculadora);
    }

    #[test]
    fn test_response_values_win_over_form() {
        let payload = json!({
            "cabecalho": { "disciplina": "Álgebra", "duracao": 50 },
            "metadata": { "nivel_dificuldade": "3", "estilo": "contextualizado", "tempo_total": 90 },
            "instrucoes": ["Use caneta azul."],
            "questoes": [{
                "numero": 4,
                "pontuacao": "2,0 pontos",
                "enunciado": "Q",
                "tipo": "verdadeiro_falso",
                "alternativas": [{ "letra": "A", "texto": "V" }, { "letra": "B", "texto": "F" }],
                "resposta_correta": "B"
            }]
        });
        let a = parse_assessment(&wrap(&payload), &form(), now()).unwrap().assessment;

        assert_eq!(a.cabecalho.disciplina, "Álgebra");
        assert_eq!(a.cabecalho.duracao, "50");
        assert_eq!(a.metadata.nivel_dificuldade, 3);
        assert_eq!(a.metadata.estilo, "contextualizado");
        assert_eq!(a.metadata.tempo_total, 90);
        assert_eq!(a.instrucoes, vec!["Use caneta azul."]);
        let q = &a.questoes[0];
        assert_eq!(q.numero, 4);
        assert_eq!(q.alternativas[1].letra, "b");
        assert_eq!(q.resposta_correta, "b");
        assert_eq!(a.gabarito, vec!["Questão 4: B"]);
    }

    #[test]
    fn test_malformed_instructions_use_defaults() {
        let payload = json!({
            "instrucoes": "leia tudo",
            "questoes": [{ "enunciado": "Q", "alternativas": ["x"] }]
        });
        let a = parse_assessment(&wrap(&payload), &form(), now()).unwrap().assessment;
        assert_eq!(a.instrucoes, DEFAULT_INSTRUCTIONS.to_vec());
    }

    #[test]
    fn test_server_gabarito_is_ignored() {
        let payload = json!({
            "gabarito": ["Questão 1: D"],
            "questoes": [{ "enunciado": "Q", "alternativas": ["x", "y"], "resposta_correta": "b" }]
        });
        let a = parse_assessment(&wrap(&payload), &form(), now()).unwrap().assessment;
        assert_eq!(a.gabarito, vec!["Questão 1: B"]);
    }

    #[test]
    fn test_string_alternatives_get_positional_letters() {
        let payload = json!({ "questoes": [{ "enunciado": "Q", "alternativas": ["x", "y", "z"] }] });
        let a = parse_assessment(&wrap(&payload), &form(), now()).unwrap().assessment;
        let letters: Vec<&str> = a.questoes[0].alternativas.iter().map(|alt| alt.letra.as_str()).collect();
        assert_eq!(letters, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_position_letter() {
        assert_eq!(position_letter(0), "a");
        assert_eq!(position_letter(25), "z");
        assert_eq!(position_letter(26), "a27");
    }

    #[test]
    fn test_missing_alternatives_rejected() {
        let payload = json!({
            "questoes": [
                { "enunciado": "ok", "alternativas": ["x"] },
                { "enunciado": "sem alternativas" }
            ]
        });
        let err = parse_assessment(&wrap(&payload), &form(), now()).unwrap_err();
        assert_eq!(
            err,
            ParseError::Validation {
                question: Some(2),
                message: "missing 'alternativas'".into()
            }
        );
    }

    #[test]
    fn test_empty_alternatives_rejected() {
        let payload = json!({ "questoes": [{ "enunciado": "Q", "alternativas": [] }] });
        let err = parse_assessment(&wrap(&payload), &form(), now()).unwrap_err();
        assert!(err.to_string().contains("question 1"));
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_missing_or_blank_prompt_rejected() {
        let payload = json!({ "questoes": [{ "alternativas": ["x"] }] });
        assert!(parse_assessment(&wrap(&payload), &form(), now()).is_err());

        let payload = json!({ "questoes": [{ "enunciado": "  ", "alternativas": ["x"] }] });
        let err = parse_assessment(&wrap(&payload), &form(), now()).unwrap_err();
        assert!(err.to_string().contains("enunciado"));
    }

    #[test]
    fn test_missing_or_empty_questions_rejected() {
        let err = parse_assessment(&wrap(&json!({ "titulo": "x" })), &form(), now()).unwrap_err();
        assert_eq!(err, ParseError::validation("missing 'questoes'"));

        let err = parse_assessment(&wrap(&json!({ "questoes": [] })), &form(), now()).unwrap_err();
        assert_eq!(err, ParseError::validation("'questoes' is empty"));
    }

    #[test]
    fn test_invalid_optional_field_is_error_not_default() {
        let payload = json!({
            "questoes": [{ "enunciado": "Q", "alternativas": ["x"], "pontuacao": ["1"] }]
        });
        let err = parse_assessment(&wrap(&payload), &form(), now()).unwrap_err();
        assert!(err.to_string().contains("'pontuacao' must be a string"));

        let payload = json!({
            "metadata": { "permite_calculadora": "talvez" },
            "questoes": [{ "enunciado": "Q", "alternativas": ["x"] }]
        });
        let err = parse_assessment(&wrap(&payload), &form(), now()).unwrap_err();
        assert!(err.to_string().contains("metadata.permite_calculadora"));

        let payload = json!({ "cabecalho": "x", "questoes": [{ "enunciado": "Q", "alternativas": ["x"] }] });
        assert!(parse_assessment(&wrap(&payload), &form(), now()).is_err());
    }

    #[test]
    fn test_avaliacao_wrapper_inside_payload() {
        let payload = json!({ "avaliacao": { "questoes": [{ "enunciado": "Q", "alternativas": ["x"] }] } });
        let a = parse_assessment(&wrap(&payload), &form(), now()).unwrap().assessment;
        assert_eq!(a.questoes.len(), 1);
    }

    #[test]
    fn test_avaliacao_envelope() {
        let raw = json!({ "avaliacao": { "questoes": [{ "enunciado": "Q", "alternativas": ["x"] }] } });
        let parsed = parse_assessment(&raw, &form(), now()).unwrap();
        assert_eq!(parsed.debug_info.detected_shape, Some(ResponseShape::AvaliacaoField));
    }

    #[test]
    fn test_bare_string_not_json() {
        let err = parse_assessment(&json!("not json"), &form(), now()).unwrap_err();
        assert!(matches!(err, ParseError::MalformedPayload(_)));
    }

    #[test]
    fn test_unknown_structure() {
        let raw = json!({ "message": "Workflow was started" });
        let err = parse_assessment(&raw, &form(), now()).unwrap_err();
        assert_eq!(err, ParseError::InvalidResponseStructure { raw });
    }

    #[test]
    fn test_normalizing_normalized_output_is_stable() {
        let payload = json!({
            "questoes": [
                { "enunciado": "A", "alternativas": ["x", "y"], "resposta_correta": "b" },
                { "enunciado": "B", "alternativas": [{ "texto": "z" }] }
            ]
        });
        let first = parse_assessment(&wrap(&payload), &form(), now()).unwrap().assessment;

        let again = wrap(&serde_json::to_value(&first).unwrap());
        let second = parse_assessment(&again, &form(), now()).unwrap().assessment;

        assert_eq!(first.questoes, second.questoes);
        assert_eq!(first.gabarito, second.gabarito);
        assert_eq!(second, first);
    }
}
