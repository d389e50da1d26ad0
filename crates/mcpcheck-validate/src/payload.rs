//! Result payloads of `tools/call`, `resources/read` and `prompts/get`.

use crate::result::{Checker, ValidationResult};
use crate::{non_empty_str, type_name};
use serde_json::Value;

/// Check a `tools/call` result: a `content` array and an optional `isError`.
pub fn check_tool_result(result: &Value) -> ValidationResult {
    let mut checker = Checker::new();
    match result.get("content") {
        Some(Value::Array(items)) => {
            for (index, item) in items.iter().enumerate() {
                check_content(&mut checker, &format!("content[{index}]"), item);
            }
        }
        Some(other) => checker.error(format!(
            "content must be an array, got {}",
            type_name(other)
        )),
        None => checker.error("tools/call result is missing content"),
    }
    if let Some(is_error) = result.get("isError") {
        if !is_error.is_boolean() {
            checker.error(format!(
                "isError must be a boolean, got {}",
                type_name(is_error)
            ));
        }
    }
    checker.finish()
}

/// Check a `resources/read` result: every entry has a `uri` and `text` or `blob`.
pub fn check_resource_contents(result: &Value) -> ValidationResult {
    let mut checker = Checker::new();
    match result.get("contents") {
        Some(Value::Array(entries)) => {
            if entries.is_empty() {
                checker.warn("resources/read returned no contents");
            }
            for (index, entry) in entries.iter().enumerate() {
                check_resource_entry(&mut checker, &format!("contents[{index}]"), entry);
            }
        }
        Some(other) => checker.error(format!(
            "contents must be an array, got {}",
            type_name(other)
        )),
        None => checker.error("resources/read result is missing contents"),
    }
    checker.finish()
}

/// Check a `prompts/get` result: a `messages` array of role-tagged content.
pub fn check_prompt_messages(result: &Value) -> ValidationResult {
    let mut checker = Checker::new();
    match result.get("messages") {
        Some(Value::Array(messages)) => {
            for (index, message) in messages.iter().enumerate() {
                let at = format!("messages[{index}]");
                match message.get("role").and_then(Value::as_str) {
                    Some("user" | "assistant") => {}
                    Some(role) => checker.error(format!("{at}.role '{role}' is not user or assistant")),
                    None => checker.error(format!("{at} is missing role")),
                }
                match message.get("content") {
                    Some(content) => check_content(&mut checker, &format!("{at}.content"), content),
                    None => checker.error(format!("{at} is missing content")),
                }
            }
        }
        Some(other) => checker.error(format!(
            "messages must be an array, got {}",
            type_name(other)
        )),
        None => checker.error("prompts/get result is missing messages"),
    }
    checker.finish()
}

/// One typed content item.
fn check_content(checker: &mut Checker, at: &str, item: &Value) {
    let Some(kind) = item.get("type").and_then(Value::as_str) else {
        checker.error(format!("{at} is missing type"));
        return;
    };
    let required: &[&str] = match kind {
        "text" => &["text"],
        "image" | "audio" => &["data", "mimeType"],
        "resource_link" => &["uri", "name"],
        "resource" => {
            match item.get("resource") {
                Some(resource) => check_resource_entry(checker, &format!("{at}.resource"), resource),
                None => checker.error(format!("{at} is missing resource")),
            }
            &[]
        }
        other => {
            checker.warn(format!("{at} has unknown content type '{other}'"));
            &[]
        }
    };
    for field in required {
        if !item.get(*field).is_some_and(Value::is_string) {
            checker.error(format!("{at} ({kind}) is missing {field}"));
        }
    }
}

fn check_resource_entry(checker: &mut Checker, at: &str, entry: &Value) {
    if non_empty_str(entry, "uri").is_none() {
        checker.error(format!("{at} is missing uri"));
    }
    let has_text = entry.get("text").is_some_and(Value::is_string);
    let has_blob = entry.get("blob").is_some_and(Value::is_string);
    if !has_text && !has_blob {
        checker.error(format!("{at} must carry text or blob"));
    }
}
