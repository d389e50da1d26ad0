//! Error handling: malformed calls must fail with the right protocol code.

use crate::scenario::{Outcome, ScenarioFuture, require};
use mcpcheck_harness::{Harness, HarnessError, Response};
use mcpcheck_validate::{ErrorCode, check_envelope, check_error_code};
use serde_json::{Value, json};
use std::sync::Arc;

pub const INVALID_METHOD: &str = "Invalid Method";
pub const INVALID_PARAMS: &str = "Invalid Params";

/// A method no server is expected to implement.
const UNKNOWN_METHOD: &str = "mcpcheck/nonexistent-method";

fn error_code(response: &Response) -> Option<i64> {
    response.envelope()["error"]["code"].as_i64()
}

/// Check that `response` refuses the call with `expected`.
fn expect_error(response: &Response, expected: ErrorCode) -> Result<Outcome, HarnessError> {
    let mut notes = require(check_envelope(response.envelope()))?;
    notes.extend(require(check_error_code(
        response.envelope().get("error"),
        expected,
    ))?);
    Ok(Outcome::Passed(notes))
}

pub fn invalid_method(harness: Arc<Harness>) -> ScenarioFuture {
    Box::pin(async move {
        let response = harness.request(UNKNOWN_METHOD, None).await?;
        expect_error(&response, ErrorCode::MethodNotFound)
    })
}

pub fn invalid_params(harness: Arc<Harness>) -> ScenarioFuture {
    Box::pin(async move {
        // `name` is required by tools/call
        let params: Value = json!({"arguments": {}});
        let response = harness.request("tools/call", Some(params)).await?;
        if error_code(&response) == Some(ErrorCode::MethodNotFound.code()) {
            return Ok(Outcome::skip("server does not implement tools/call"));
        }
        expect_error(&response, ErrorCode::InvalidParams)
    })
}
