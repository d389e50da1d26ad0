//! Tools, resources and prompts: listing and invoking declared capabilities.
//!
//! Each scenario lists the capability itself instead of relying on an earlier
//! scenario's discovery, so scenarios stay independent of one another.

use crate::arguments::{prompt_arguments, tool_arguments};
use crate::scenario::{Outcome, ScenarioFuture, exchange, require};
use mcpcheck_harness::{Harness, HarnessError};
use mcpcheck_validate::{
    DeclarationKind, ErrorCode, check_listing, check_prompt_messages, check_resource_contents,
    check_tool_result,
};
use serde_json::{Value, json};
use std::sync::Arc;

pub const LIST_TOOLS: &str = "List Tools";
pub const CALL_TOOL: &str = "Call Tool";
pub const LIST_RESOURCES: &str = "List Resources";
pub const READ_RESOURCE: &str = "Read Resource";
pub const LIST_PROMPTS: &str = "List Prompts";
pub const GET_PROMPT: &str = "Get Prompt";

/// What listing a capability produced.
enum Listing {
    Declared {
        entries: Vec<Value>,
        notes: Vec<String>,
    },
    /// The server answered the list method with method-not-found.
    Unsupported,
}

/// List one capability kind and validate every declaration.
async fn list(harness: &Harness, kind: DeclarationKind) -> Result<Listing, HarnessError> {
    let (result, mut notes) = match exchange(harness, kind.list_method(), None).await {
        Err(e) if e.protocol_code() == Some(ErrorCode::MethodNotFound.code()) => {
            return Ok(Listing::Unsupported);
        }
        other => other?,
    };
    notes.extend(require(check_listing(kind, &result))?);

    let entries = result
        .get(kind.list_field())
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    tracing::debug!("server declares {} {}(s)", entries.len(), kind);
    Ok(Listing::Declared { entries, notes })
}

async fn list_scenario(harness: Arc<Harness>, kind: DeclarationKind) -> Result<Outcome, HarnessError> {
    match list(&harness, kind).await? {
        Listing::Declared { entries, mut notes } => {
            if entries.is_empty() {
                notes.push(format!("server declares no {}", kind.list_field()));
            }
            Ok(Outcome::Passed(notes))
        }
        Listing::Unsupported => Ok(Outcome::skip(format!(
            "server does not implement {}",
            kind.list_method()
        ))),
    }
}

/// First declared entry, or the reason to skip.
async fn first_declared(harness: &Harness, kind: DeclarationKind) -> Result<Result<Value, Outcome>, HarnessError> {
    match list(harness, kind).await? {
        Listing::Declared { entries, .. } => Ok(entries.into_iter().next().ok_or_else(|| {
            Outcome::skip(format!("server declares no {}", kind.list_field()))
        })),
        Listing::Unsupported => Ok(Err(Outcome::skip(format!(
            "server does not implement {}",
            kind.list_method()
        )))),
    }
}

/// Arguments are synthesized from the declaration, so a server rejecting
/// their values with invalid-params has still answered correctly.
fn accept_invalid_params(
    outcome: Result<(Value, Vec<String>), HarnessError>,
) -> Result<Option<(Value, Vec<String>)>, HarnessError> {
    match outcome {
        Err(e) if e.protocol_code() == Some(ErrorCode::InvalidParams.code()) => Ok(None),
        other => other.map(Some),
    }
}

pub fn list_tools(harness: Arc<Harness>) -> ScenarioFuture {
    Box::pin(list_scenario(harness, DeclarationKind::Tool))
}

pub fn call_tool(harness: Arc<Harness>) -> ScenarioFuture {
    Box::pin(async move {
        let tool = match first_declared(&harness, DeclarationKind::Tool).await? {
            Ok(tool) => tool,
            Err(skip) => return Ok(skip),
        };
        let name = tool["name"].as_str().unwrap_or_default().to_string();
        let arguments = tool_arguments(tool.get("inputSchema").unwrap_or(&Value::Null));

        let params = json!({"name": name, "arguments": arguments});
        let Some((result, mut notes)) =
            accept_invalid_params(exchange(&harness, "tools/call", Some(params)).await)?
        else {
            return Ok(Outcome::Passed(vec![format!(
                "tool '{name}' rejected placeholder arguments with invalid params"
            )]));
        };
        notes.extend(require(check_tool_result(&result))?);
        if result.get("isError").and_then(Value::as_bool) == Some(true) {
            notes.push(format!("tool '{name}' reported isError for placeholder arguments"));
        }
        Ok(Outcome::Passed(notes))
    })
}

pub fn list_resources(harness: Arc<Harness>) -> ScenarioFuture {
    Box::pin(list_scenario(harness, DeclarationKind::Resource))
}

pub fn read_resource(harness: Arc<Harness>) -> ScenarioFuture {
    Box::pin(async move {
        let resource = match first_declared(&harness, DeclarationKind::Resource).await? {
            Ok(resource) => resource,
            Err(skip) => return Ok(skip),
        };
        let uri = resource["uri"].clone();

        let (result, mut notes) =
            exchange(&harness, "resources/read", Some(json!({"uri": uri}))).await?;
        notes.extend(require(check_resource_contents(&result))?);

        let echoed = result["contents"]
            .as_array()
            .is_some_and(|contents| contents.iter().any(|c| c["uri"] == uri));
        if !echoed {
            notes.push(format!("no content entry carries the requested uri {uri}"));
        }
        Ok(Outcome::Passed(notes))
    })
}

pub fn list_prompts(harness: Arc<Harness>) -> ScenarioFuture {
    Box::pin(list_scenario(harness, DeclarationKind::Prompt))
}

pub fn get_prompt(harness: Arc<Harness>) -> ScenarioFuture {
    Box::pin(async move {
        let prompt = match first_declared(&harness, DeclarationKind::Prompt).await? {
            Ok(prompt) => prompt,
            Err(skip) => return Ok(skip),
        };
        let name = prompt["name"].as_str().unwrap_or_default().to_string();

        let params = json!({"name": name, "arguments": prompt_arguments(&prompt)});
        let Some((result, mut notes)) =
            accept_invalid_params(exchange(&harness, "prompts/get", Some(params)).await)?
        else {
            return Ok(Outcome::Passed(vec![format!(
                "prompt '{name}' rejected placeholder arguments with invalid params"
            )]));
        };
        notes.extend(require(check_prompt_messages(&result))?);
        Ok(Outcome::Passed(notes))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_params_is_accepted() {
        let outcome = accept_invalid_params(Err(HarnessError::Protocol {
            code: -32602,
            message: "bad arguments".into(),
            data: None,
        }));
        assert!(matches!(outcome, Ok(None)));
    }

    #[test]
    fn other_errors_still_fail() {
        let outcome = accept_invalid_params(Err(HarnessError::Protocol {
            code: -32603,
            message: "boom".into(),
            data: None,
        }));
        assert!(outcome.is_err());
        assert!(accept_invalid_params(Err(HarnessError::TransportClosed)).is_err());
    }

    #[test]
    fn results_pass_through() {
        let outcome = accept_invalid_params(Ok((json!({"content": []}), vec![]))).unwrap();
        assert_eq!(outcome.unwrap().0, json!({"content": []}));
    }
}
