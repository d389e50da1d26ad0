//! JSON-RPC 2.0 envelope shape.

use crate::result::{Checker, ValidationResult};
use crate::type_name;
use serde_json::Value;

/// Check the base envelope of any message.
///
/// The role is inferred from the fields present: `method` with `id` is a
/// request, `method` alone a notification, anything else a response.
pub fn check_envelope(message: &Value) -> ValidationResult {
    let mut checker = Checker::new();

    let Some(object) = message.as_object() else {
        checker.error(format!(
            "message must be a JSON object, got {}",
            type_name(message)
        ));
        return checker.finish();
    };

    match object.get("jsonrpc") {
        Some(Value::String(tag)) if tag == "2.0" => {}
        Some(other) => checker.error(format!("jsonrpc must be \"2.0\", got {other}")),
        None => checker.error("missing jsonrpc field"),
    }

    match object.get("method") {
        Some(method) => {
            check_call(&mut checker, object, method);
        }
        None => check_response(&mut checker, object),
    }

    checker.finish()
}

/// Requests and notifications.
fn check_call(checker: &mut Checker, object: &serde_json::Map<String, Value>, method: &Value) {
    match method.as_str() {
        Some("") => checker.error("method must not be empty"),
        Some(_) => {}
        None => checker.error(format!(
            "method must be a string, got {}",
            type_name(method)
        )),
    }

    if let Some(params) = object.get("params") {
        if !params.is_object() && !params.is_array() {
            checker.error(format!(
                "params must be an object or array, got {}",
                type_name(params)
            ));
        }
    }

    if let Some(id) = object.get("id") {
        check_id(checker, id, false);
    }

    for field in ["result", "error"] {
        if object.contains_key(field) {
            checker.error(format!("request must not carry {field}"));
        }
    }
}

fn check_response(checker: &mut Checker, object: &serde_json::Map<String, Value>) {
    let error = object.get("error");

    match object.get("id") {
        Some(id) => check_id(checker, id, error.is_some()),
        None => checker.error("response is missing id"),
    }

    match (object.get("result"), error) {
        (Some(_), Some(_)) => checker.error("response must not carry both result and error"),
        (None, None) => checker.error("response must carry either result or error"),
        (None, Some(error)) => check_error_object(checker, error),
        (Some(_), None) => {}
    }
}

/// `id` is a string or number; null only on error responses.
fn check_id(checker: &mut Checker, id: &Value, null_allowed: bool) {
    match id {
        Value::String(_) | Value::Number(_) => {}
        Value::Null if null_allowed => {}
        other => checker.error(format!(
            "id must be a string or number, got {}",
            type_name(other)
        )),
    }
}

fn check_error_object(checker: &mut Checker, error: &Value) {
    let Some(object) = error.as_object() else {
        checker.error(format!(
            "error must be an object, got {}",
            type_name(error)
        ));
        return;
    };
    match object.get("code") {
        Some(code) if code.is_i64() => {}
        Some(code) => checker.error(format!(
            "error.code must be an integer, got {code}"
        )),
        None => checker.error("error is missing code"),
    }
    match object.get("message") {
        Some(Value::String(_)) => {}
        Some(other) => checker.error(format!(
            "error.message must be a string, got {}",
            type_name(other)
        )),
        None => checker.error("error is missing message"),
    }
}
