//! JSON value predicates shared by the validators and field rewriters
//!
//! `serde_json::Value` is already the tagged sum the rewriters pattern-match
//! on; these helpers only name the checks that recur across modules.

use serde_json::Value;

/// Runtime type tag of a JSON value, used in error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Whether a value can serve as a foreign id: a string or a number.
///
/// JSON numbers are always finite, so no separate finiteness check is needed.
pub fn is_id_like(value: &Value) -> bool {
    matches!(value, Value::String(_) | Value::Number(_))
}

/// Render an id-like value as a node-id seed.
///
/// Strings contribute their raw content (no quotes) and numbers their decimal
/// form, so the id `42` and the string `"42"` resolve to the same node; the
/// CMS is not consistent about which one it emits.
pub fn id_seed(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Upper-case the first character of a type name.
pub fn upper_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
