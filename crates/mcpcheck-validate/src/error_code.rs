//! JSON-RPC error codes.

use crate::result::{Checker, ValidationResult};
use crate::type_name;
use serde_json::Value;
use std::fmt;

/// Error codes defined by JSON-RPC 2.0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    ParseError,
    InvalidRequest,
    MethodNotFound,
    InvalidParams,
    InternalError,
}

impl ErrorCode {
    pub fn code(self) -> i64 {
        match self {
            ErrorCode::ParseError => -32700,
            ErrorCode::InvalidRequest => -32600,
            ErrorCode::MethodNotFound => -32601,
            ErrorCode::InvalidParams => -32602,
            ErrorCode::InternalError => -32603,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            -32700 => Some(ErrorCode::ParseError),
            -32600 => Some(ErrorCode::InvalidRequest),
            -32601 => Some(ErrorCode::MethodNotFound),
            -32602 => Some(ErrorCode::InvalidParams),
            -32603 => Some(ErrorCode::InternalError),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCode::ParseError => "parse error",
            ErrorCode::InvalidRequest => "invalid request",
            ErrorCode::MethodNotFound => "method not found",
            ErrorCode::InvalidParams => "invalid params",
            ErrorCode::InternalError => "internal error",
        };
        write!(f, "{name} ({})", self.code())
    }
}

/// Check that an error object carries exactly the `expected` code.
///
/// `error` is the `error` member of a response; `None` means the server
/// answered with a result where a failure was expected.
pub fn check_error_code(error: Option<&Value>, expected: ErrorCode) -> ValidationResult {
    let mut checker = Checker::new();
    let Some(error) = error else {
        checker.error(format!("expected {expected} error, got a result"));
        return checker.finish();
    };

    match error.get("code") {
        Some(code) => match code.as_i64() {
            Some(code) if code == expected.code() => {}
            Some(code) => {
                let actual = ErrorCode::from_code(code)
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| code.to_string());
                checker.error(format!("expected {expected} error, got {actual}"));
            }
            None => checker.error(format!(
                "error.code must be an integer, got {}",
                type_name(code)
            )),
        },
        None => checker.error("error is missing code"),
    }

    if error.get("message").and_then(Value::as_str).is_none() {
        checker.warn("error has no message");
    }
    checker.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn codes_match_json_rpc() {
        for code in [
            ErrorCode::ParseError,
            ErrorCode::InvalidRequest,
            ErrorCode::MethodNotFound,
            ErrorCode::InvalidParams,
            ErrorCode::InternalError,
        ] {
            assert_eq!(ErrorCode::from_code(code.code()), Some(code));
        }
        assert_eq!(ErrorCode::MethodNotFound.code(), -32601);
        assert_eq!(ErrorCode::from_code(-32000), None);
        assert_eq!(
            ErrorCode::InvalidParams.to_string(),
            "invalid params (-32602)"
        );
    }

    #[test]
    fn exact_code_passes() {
        let error = json!({"code": -32601, "message": "Method not found"});
        let result = check_error_code(Some(&error), ErrorCode::MethodNotFound);
        assert!(result.valid);
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn other_code_fails() {
        let error = json!({"code": -32603, "message": "Internal error"});
        let result = check_error_code(Some(&error), ErrorCode::MethodNotFound);
        assert!(!result.valid);
        assert_eq!(
            result.errors().next(),
            Some("expected method not found (-32601) error, got internal error (-32603)")
        );

        let error = json!({"code": -32000, "message": "Server error"});
        let result = check_error_code(Some(&error), ErrorCode::InvalidParams);
        assert!(result.errors().next().unwrap().ends_with("got -32000"));
    }

    #[test]
    fn result_instead_of_error_fails() {
        let result = check_error_code(None, ErrorCode::MethodNotFound);
        assert!(!result.valid);
    }

    #[test]
    fn missing_message_is_a_warning() {
        let error = json!({"code": -32602});
        let result = check_error_code(Some(&error), ErrorCode::InvalidParams);
        assert!(result.valid);
        assert_eq!(result.warnings().count(), 1);
    }
}
