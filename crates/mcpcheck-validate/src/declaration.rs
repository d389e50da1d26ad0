//! Tool, resource and prompt declarations as returned by the `*/list` methods.

use crate::result::{Checker, ValidationResult};
use crate::{non_empty_str, type_name};
use serde_json::Value;
use std::fmt;

/// Which kind of capability a declaration describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationKind {
    Tool,
    Resource,
    Prompt,
}

impl DeclarationKind {
    /// The array field holding declarations in a list result.
    pub fn list_field(self) -> &'static str {
        match self {
            DeclarationKind::Tool => "tools",
            DeclarationKind::Resource => "resources",
            DeclarationKind::Prompt => "prompts",
        }
    }

    /// The method listing declarations of this kind.
    pub fn list_method(self) -> &'static str {
        match self {
            DeclarationKind::Tool => "tools/list",
            DeclarationKind::Resource => "resources/list",
            DeclarationKind::Prompt => "prompts/list",
        }
    }
}

impl fmt::Display for DeclarationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DeclarationKind::Tool => "tool",
            DeclarationKind::Resource => "resource",
            DeclarationKind::Prompt => "prompt",
        })
    }
}

/// Check one declaration for the fields its kind requires.
///
/// Missing mandatory fields are errors; missing optional metadata is a warning.
pub fn check_declaration(kind: DeclarationKind, payload: &Value) -> ValidationResult {
    let mut checker = Checker::new();
    if !payload.is_object() {
        checker.error(format!(
            "{kind} declaration must be an object, got {}",
            type_name(payload)
        ));
        return checker.finish();
    }

    match kind {
        DeclarationKind::Tool => check_tool(&mut checker, payload),
        DeclarationKind::Resource => check_resource(&mut checker, payload),
        DeclarationKind::Prompt => check_prompt(&mut checker, payload),
    }
    checker.finish()
}

/// Check a `*/list` result: the kind's array field and every entry in it.
///
/// An empty list is valid. Entry diagnostics are prefixed with the entry index.
pub fn check_listing(kind: DeclarationKind, result: &Value) -> ValidationResult {
    let mut checker = Checker::new();
    let field = kind.list_field();

    match result.get(field) {
        Some(Value::Array(entries)) => {
            for (index, entry) in entries.iter().enumerate() {
                let mut entry_checker = Checker::with_prefix(format!("{field}[{index}]"));
                entry_checker.absorb(check_declaration(kind, entry));
                checker.absorb(entry_checker.finish());
            }
            check_unique_names(&mut checker, kind, entries);
        }
        Some(other) => checker.error(format!(
            "{field} must be an array, got {}",
            type_name(other)
        )),
        None => checker.error(format!("{} result is missing {field}", kind.list_method())),
    }

    if let Some(cursor) = result.get("nextCursor") {
        if !cursor.is_string() && !cursor.is_null() {
            checker.error(format!(
                "nextCursor must be a string, got {}",
                type_name(cursor)
            ));
        }
    }

    checker.finish()
}

fn check_tool(checker: &mut Checker, tool: &Value) {
    require_name(checker, tool);

    match tool.get("inputSchema") {
        Some(schema) if schema.is_object() => match schema.get("type") {
            Some(Value::String(t)) if t == "object" => {}
            Some(other) => checker.error(format!(
                "inputSchema.type must be \"object\", got {other}"
            )),
            None => checker.warn("inputSchema is missing type"),
        },
        Some(other) => checker.error(format!(
            "inputSchema must be an object, got {}",
            type_name(other)
        )),
        None => checker.error("missing required field inputSchema"),
    }

    if non_empty_str(tool, "description").is_none() {
        checker.warn("tool has no description");
    }
}

fn check_resource(checker: &mut Checker, resource: &Value) {
    if non_empty_str(resource, "uri").is_none() {
        checker.error("missing required field uri");
    }
    require_name(checker, resource);
    if non_empty_str(resource, "description").is_none() {
        checker.warn("resource has no description");
    }
    if non_empty_str(resource, "mimeType").is_none() {
        checker.warn("resource has no mimeType");
    }
}

fn check_prompt(checker: &mut Checker, prompt: &Value) {
    require_name(checker, prompt);
    if non_empty_str(prompt, "description").is_none() {
        checker.warn("prompt has no description");
    }

    match prompt.get("arguments") {
        None | Some(Value::Null) => {}
        Some(Value::Array(arguments)) => {
            for (index, argument) in arguments.iter().enumerate() {
                if non_empty_str(argument, "name").is_none() {
                    checker.error(format!("arguments[{index}] is missing name"));
                }
                if let Some(required) = argument.get("required") {
                    if !required.is_boolean() {
                        checker.error(format!("arguments[{index}].required must be a boolean"));
                    }
                }
            }
        }
        Some(other) => checker.error(format!(
            "arguments must be an array, got {}",
            type_name(other)
        )),
    }
}

fn require_name(checker: &mut Checker, payload: &Value) {
    if non_empty_str(payload, "name").is_none() {
        checker.error("missing required field name");
    }
}

fn check_unique_names(checker: &mut Checker, kind: DeclarationKind, entries: &[Value]) {
    // Resources are keyed by uri, tools and prompts by name
    let key = match kind {
        DeclarationKind::Resource => "uri",
        DeclarationKind::Tool | DeclarationKind::Prompt => "name",
    };
    let mut seen = std::collections::HashSet::new();
    for entry in entries {
        if let Some(value) = entry.get(key).and_then(Value::as_str) {
            if !seen.insert(value) {
                checker.error(format!("duplicate {kind} {key} '{value}'"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tool_without_input_schema_names_the_field() {
        let result = check_declaration(DeclarationKind::Tool, &json!({"name": "x"}));
        assert!(!result.valid);
        assert!(
            result.errors().any(|e| e.contains("inputSchema")),
            "{:?}",
            result.messages()
        );
    }

    #[test]
    fn tool_with_input_schema_is_valid() {
        let result = check_declaration(
            DeclarationKind::Tool,
            &json!({"name": "x", "inputSchema": {"type": "object", "properties": {}}}),
        );
        assert!(result.valid);
        // Only the missing description is reported
        assert_eq!(result.warnings().collect::<Vec<_>>(), ["tool has no description"]);
    }

    #[test]
    fn tool_schema_type_must_be_object() {
        let result = check_declaration(
            DeclarationKind::Tool,
            &json!({"name": "x", "description": "d", "inputSchema": {"type": "string"}}),
        );
        assert!(!result.valid);

        let result = check_declaration(
            DeclarationKind::Tool,
            &json!({"name": "x", "description": "d", "inputSchema": {}}),
        );
        assert!(result.valid);
        assert_eq!(result.warnings().count(), 1);
    }

    #[test]
    fn resource_needs_uri_and_name() {
        let result = check_declaration(DeclarationKind::Resource, &json!({"name": "readme"}));
        assert!(!result.valid);
        assert_eq!(result.errors().collect::<Vec<_>>(), ["missing required field uri"]);

        let result = check_declaration(
            DeclarationKind::Resource,
            &json!({"uri": "file:///readme.md", "name": "readme"}),
        );
        assert!(result.valid);
        assert_eq!(result.warnings().count(), 2);
    }

    #[test]
    fn prompt_arguments_need_names() {
        let result = check_declaration(
            DeclarationKind::Prompt,
            &json!({
                "name": "summarize",
                "description": "Summarize text",
                "arguments": [{"name": "text", "required": true}, {"description": "?"}]
            }),
        );
        assert!(!result.valid);
        assert_eq!(
            result.errors().collect::<Vec<_>>(),
            ["arguments[1] is missing name"]
        );
    }

    #[test]
    fn non_object_declaration() {
        let result = check_declaration(DeclarationKind::Prompt, &json!("summarize"));
        assert!(!result.valid);
        assert_eq!(
            result.errors().next(),
            Some("prompt declaration must be an object, got string")
        );
    }

    #[test]
    fn empty_listing_is_valid() {
        let result = check_listing(DeclarationKind::Prompt, &json!({"prompts": []}));
        assert!(result.valid);
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn listing_prefixes_entry_index() {
        let result = check_listing(
            DeclarationKind::Tool,
            &json!({"tools": [
                {"name": "ok", "description": "fine", "inputSchema": {"type": "object"}},
                {"name": "broken"}
            ]}),
        );
        assert!(!result.valid);
        assert!(
            result.errors().all(|e| e.starts_with("tools[1]: ")),
            "{:?}",
            result.messages()
        );
    }

    #[test]
    fn listing_requires_array_field() {
        let result = check_listing(DeclarationKind::Resource, &json!({}));
        assert!(!result.valid);
        assert_eq!(
            result.errors().next(),
            Some("resources/list result is missing resources")
        );

        let result = check_listing(DeclarationKind::Tool, &json!({"tools": {}}));
        assert!(!result.valid);
    }

    #[test]
    fn listing_rejects_duplicates_and_bad_cursor() {
        let result = check_listing(
            DeclarationKind::Resource,
            &json!({
                "resources": [
                    {"uri": "a://1", "name": "one"},
                    {"uri": "a://1", "name": "two"}
                ],
                "nextCursor": 5
            }),
        );
        let errors: Vec<_> = result.errors().collect();
        assert_eq!(errors.len(), 2, "{errors:?}");
        assert!(errors[0].contains("duplicate resource uri 'a://1'"));
        assert!(errors[1].contains("nextCursor"));
    }
}
