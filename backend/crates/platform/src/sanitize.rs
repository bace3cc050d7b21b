//! Outbound Payload Sanitization
//!
//! Strips credential-looking keys from caller-assembled JSON before it
//! leaves the process.

use serde_json::{Map, Value};

/// Key fragments that mark a field as sensitive (matched case-insensitively)
pub const SENSITIVE_KEY_FRAGMENTS: &[&str] = &["password", "token", "secret"];

/// Whether a key name looks like it carries a credential
pub fn is_sensitive_key(key: &str) -> bool {
    let lower = key.to_lowercase();
    SENSITIVE_KEY_FRAGMENTS
        .iter()
        .any(|fragment| lower.contains(fragment))
}

/// Remove sensitive keys in place, descending into nested objects and arrays
///
/// ## Returns
/// The number of keys removed
pub fn sanitize_payload(value: &mut Value) -> usize {
    match value {
        Value::Object(map) => sanitize_map(map),
        Value::Array(items) => items.iter_mut().map(sanitize_payload).sum(),
        _ => 0,
    }
}

/// [`sanitize_payload`] for a payload already known to be an object
pub fn sanitize_map(map: &mut Map<String, Value>) -> usize {
    let before = map.len();
    map.retain(|key, _| !is_sensitive_key(key));
    let removed = before - map.len();
    removed + map.values_mut().map(sanitize_payload).sum::<usize>()
}
