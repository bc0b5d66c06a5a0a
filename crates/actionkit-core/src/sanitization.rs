//! Utilities for sanitizing sensitive data in logs and error messages.

use serde_json::{Map, Value as JsonValue};

const SENSITIVE_FIELDS: &[&str] = &[
    "password",
    "token",
    "access_token",
    "refresh_token",
    "client_secret",
    "api_key",
    "authorization",
    "secret",
    "private_key",
    "credential",
    "credentials",
];

/// Suffix patterns checked case-insensitively.
const SENSITIVE_PATTERNS: &[&str] = &["_key", "_token", "_secret", "_password", "_auth"];

const SANITIZED_PLACEHOLDER: &str = "***REDACTED***";

/// Check if a field name indicates sensitive data.
pub fn is_sensitive_field(field_name: &str) -> bool {
    let field_lower = field_name.to_lowercase();
    if SENSITIVE_FIELDS.iter().any(|&sensitive| field_lower == sensitive) {
        return true;
    }
    SENSITIVE_PATTERNS.iter().any(|&pattern| field_lower.contains(pattern))
}

/// Replace sensitive fields with placeholders, recursively.
pub fn sanitize_json_value(value: &JsonValue) -> JsonValue {
    match value {
        JsonValue::Object(map) => {
            let sanitized: Map<String, JsonValue> = map
                .iter()
                .map(|(key, val)| {
                    let sanitized_val = if is_sensitive_field(key) {
                        match val {
                            JsonValue::Object(_) | JsonValue::Array(_) => sanitize_json_value(val),
                            JsonValue::Null => JsonValue::Null,
                            _ => JsonValue::String(SANITIZED_PLACEHOLDER.to_string()),
                        }
                    } else {
                        sanitize_json_value(val)
                    };
                    (key.clone(), sanitized_val)
                })
                .collect();
            JsonValue::Object(sanitized)
        }
        JsonValue::Array(arr) => JsonValue::Array(arr.iter().map(sanitize_json_value).collect()),
        other => other.clone(),
    }
}

/// Create a sanitized display string for debugging.
pub fn create_debug_string(prefix: &str, json: &JsonValue) -> String {
    format!("{}: {}", prefix, sanitize_json_value(json))
}
