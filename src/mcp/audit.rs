//! Redaction of request params before they reach the logs

use serde_json::Value;

const REDACTED: &str = "[REDACTED]";

pub fn redact_params(params: Option<&Value>) -> Value {
    params.map(redact_value).unwrap_or(Value::Null)
}

fn redact_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, item)| {
                    let item = if is_sensitive_key(key) {
                        Value::String(REDACTED.to_string())
                    } else {
                        redact_value(item)
                    };
                    (key.clone(), item)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redact_value).collect()),
        _ => value.clone(),
    }
}

fn is_sensitive_key(key: &str) -> bool {
    let normalized = key.trim().to_ascii_lowercase();
    matches!(
        normalized.as_str(),
        "authorization" | "bearer" | "api_key" | "apikey"
    ) || ["token", "secret", "password", "credential"]
        .iter()
        .any(|fragment| normalized.contains(fragment))
}
