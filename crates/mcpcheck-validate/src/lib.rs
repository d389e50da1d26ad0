//! Structural checks for MCP messages and payloads.
//!
//! Every check is a pure function returning a [`ValidationResult`]. Nothing
//! here panics or returns `Err`; callers branch on [`ValidationResult::valid`].

pub mod declaration;
pub mod envelope;
pub mod error_code;
pub mod handshake;
pub mod payload;
pub mod result;

pub use declaration::{DeclarationKind, check_declaration, check_listing};
pub use envelope::check_envelope;
pub use error_code::{ErrorCode, check_error_code};
pub use handshake::{KNOWN_PROTOCOL_VERSIONS, PROTOCOL_VERSION, check_handshake};
pub use payload::{check_prompt_messages, check_resource_contents, check_tool_result};
pub use result::{Diagnostic, Severity, ValidationResult};

use serde_json::Value;

/// JSON type name for diagnostics.
pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A present, non-blank string field.
pub(crate) fn non_empty_str<'a>(value: &'a Value, field: &str) -> Option<&'a str> {
    value
        .get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}
