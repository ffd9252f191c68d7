//! JSON-RPC 2.0 response builders
//!
//! Request ids are echoed as arbitrary JSON values; a `None` id is omitted from the
//! envelope entirely, while `Some(Value::Null)` is written as `"id": null`.

use serde_json::{json, Map, Value};

pub const JSONRPC_VERSION: &str = "2.0";

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const INVALID_PARAMS: i64 = -32602;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INTERNAL_ERROR: i64 = -32603;

pub fn is_json_rpc_error(value: &Value) -> bool {
    value.get("error").is_some()
}

pub fn json_rpc_error(id: Option<Value>, code: i64, message: &str) -> Value {
    envelope(
        id,
        "error",
        json!({
            "code": code,
            "message": message
        }),
    )
}

pub fn json_rpc_result(id: Option<Value>, result: Value) -> Value {
    envelope(id, "result", result)
}

/// Extracts the `id` member of an inbound request.
///
/// Objects without an `id` yield `Some(Value::Null)`; anything that is not an
/// object yields `None` because no id can be known.
pub fn inbound_request_id(payload: &Value) -> Option<Value> {
    payload
        .as_object()
        .map(|object| object.get("id").cloned().unwrap_or(Value::Null))
}

pub fn request_method(payload: &Value) -> Option<&str> {
    payload.get("method").and_then(Value::as_str)
}

fn envelope(id: Option<Value>, key: &str, body: Value) -> Value {
    let mut object = Map::new();
    object.insert("jsonrpc".to_string(), Value::from(JSONRPC_VERSION));
    if let Some(id) = id {
        object.insert("id".to_string(), id);
    }
    object.insert(key.to_string(), body);
    Value::Object(object)
}
