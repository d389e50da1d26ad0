//! The `initialize` exchange.

use crate::result::{Checker, ValidationResult};
use crate::{non_empty_str, type_name};
use serde_json::Value;

/// Protocol version the harness offers in `initialize`.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Versions accepted from a server without a warning.
pub const KNOWN_PROTOCOL_VERSIONS: &[&str] = &["2024-11-05", "2025-03-26", "2025-06-18"];

/// Check an `initialize` request and the result the server returned for it.
///
/// `response` is the `result` member of the response, not the full envelope.
pub fn check_handshake(request: &Value, response: &Value) -> ValidationResult {
    let mut checker = Checker::new();
    check_request(&mut checker, request);
    check_result(&mut checker, response);
    checker.finish()
}

fn check_request(checker: &mut Checker, request: &Value) {
    match request.get("method").and_then(Value::as_str) {
        Some("initialize") => {}
        Some(other) => checker.error(format!(
            "handshake request must be initialize, got '{other}'"
        )),
        None => checker.error("handshake request is missing method"),
    }
    let params = request.get("params").unwrap_or(&Value::Null);
    if non_empty_str(params, "protocolVersion").is_none() {
        checker.error("initialize params are missing protocolVersion");
    }
    if params
        .get("clientInfo")
        .and_then(|info| non_empty_str(info, "name"))
        .is_none()
    {
        checker.error("initialize params are missing clientInfo.name");
    }
}

fn check_result(checker: &mut Checker, result: &Value) {
    if !result.is_object() {
        checker.error(format!(
            "initialize result must be an object, got {}",
            type_name(result)
        ));
        return;
    }

    match non_empty_str(result, "protocolVersion") {
        Some(version) if KNOWN_PROTOCOL_VERSIONS.contains(&version) => {}
        Some(version) => checker.warn(format!("unrecognized protocolVersion '{version}'")),
        None => checker.error("initialize result is missing protocolVersion"),
    }

    match result.get("serverInfo") {
        Some(info) if info.is_object() => {
            if non_empty_str(info, "name").is_none() {
                checker.error("serverInfo.name must be a non-empty string");
            }
            if non_empty_str(info, "version").is_none() {
                checker.warn("serverInfo is missing version");
            }
        }
        Some(other) => checker.error(format!(
            "serverInfo must be an object, got {}",
            type_name(other)
        )),
        None => checker.error("initialize result is missing serverInfo"),
    }

    match result.get("capabilities") {
        Some(caps) if caps.is_object() => {}
        Some(other) => checker.error(format!(
            "capabilities must be an object, got {}",
            type_name(other)
        )),
        None => checker.warn("initialize result is missing capabilities"),
    }
}
