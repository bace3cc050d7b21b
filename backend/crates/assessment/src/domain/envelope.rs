//! Response Envelope Detection
//!
//! The workflow wraps its payload in several different envelopes depending on
//! how the automation was configured. Each [`ResponseShape`] knows how to
//! recognize its own envelope; [`detect_payload`] tries them in
//! [`ResponseShape::PRIORITY`] order and stops at the first match.

use serde_json::Value;

use crate::domain::value_objects::ResponseShape;
use crate::error::{ParseError, ParseResult};

/// Payload located inside a raw response
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectedPayload<'a> {
    pub shape: ResponseShape,
    pub payload: &'a Value,
}

fn output_of(value: &Value) -> Option<&Value> {
    value.get("output").filter(|output| !output.is_null())
}

impl ResponseShape {
    /// Locate the payload if `raw` has this shape
    pub fn probe(self, raw: &Value) -> Option<&Value> {
        match self {
            ResponseShape::ArrayOutput => raw.as_array()?.first().and_then(output_of),
            ResponseShape::SuccessDataArray => {
                raw.get("success")?;
                raw.get("data")?.as_array()?.first().and_then(output_of)
            }
            ResponseShape::TopLevelOutput => raw.as_object().and_then(|_| output_of(raw)),
            ResponseShape::DataOutput => raw.get("data").filter(|d| d.is_object()).and_then(output_of),
            ResponseShape::IndexedOutput => raw.get("0").and_then(output_of),
            ResponseShape::BareString => raw.is_string().then_some(raw),
            ResponseShape::AvaliacaoField => raw.get("avaliacao").filter(|v| !v.is_null()),
        }
    }
}

/// First matching envelope, or `None` when the response has no known shape
pub fn detect_payload(raw: &Value) -> Option<DetectedPayload<'_>> {
    ResponseShape::PRIORITY.into_iter().find_map(|shape| {
        shape
            .probe(raw)
            .map(|payload| DetectedPayload { shape, payload })
    })
}

/// Turn a located payload into structured JSON
///
/// String payloads are decoded as JSON text; structured payloads are used
/// as they are.
pub fn decode_payload(payload: &Value) -> ParseResult<Value> {
    match payload {
        Value::String(text) => serde_json::from_str(text.trim())
            .map_err(|e| ParseError::MalformedPayload(e.to_string())),
        other => Ok(other.clone()),
    }
}
