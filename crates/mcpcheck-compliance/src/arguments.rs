//! Placeholder arguments for calling a declared tool or prompt.

use serde_json::{Map, Value, json};

/// Build an arguments object holding every property `schema` requires.
pub(crate) fn tool_arguments(schema: &Value) -> Value {
    let properties = schema.get("properties");
    let mut arguments = Map::new();
    for name in required_names(schema) {
        let property = properties.and_then(|p| p.get(name)).unwrap_or(&Value::Null);
        arguments.insert(name.to_string(), sample_value(property));
    }
    Value::Object(arguments)
}

/// Build a string-valued arguments map for a prompt's required arguments.
pub(crate) fn prompt_arguments(prompt: &Value) -> Value {
    let mut arguments = Map::new();
    if let Some(declared) = prompt.get("arguments").and_then(Value::as_array) {
        for argument in declared {
            let required = argument
                .get("required")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            if let (true, Some(name)) = (required, argument.get("name").and_then(Value::as_str)) {
                arguments.insert(name.to_string(), json!("test"));
            }
        }
    }
    Value::Object(arguments)
}

fn required_names(schema: &Value) -> impl Iterator<Item = &str> {
    schema
        .get("required")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
}

/// A value plausibly accepted by a JSON Schema property.
fn sample_value(property: &Value) -> Value {
    if let Some(first) = property
        .get("enum")
        .and_then(Value::as_array)
        .and_then(|values| values.first())
    {
        return first.clone();
    }
    if let Some(default) = property.get("default") {
        return default.clone();
    }

    let declared = match property.get("type") {
        Some(Value::String(t)) => Some(t.as_str()),
        // ["string", "null"] style unions: take the first non-null member
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .find(|t| *t != "null"),
        _ => None,
    };

    match declared {
        Some("integer") => json!(1),
        Some("number") => json!(1.0),
        Some("boolean") => json!(true),
        Some("array") => json!([]),
        Some("object") => tool_arguments(property),
        Some("null") => Value::Null,
        _ => json!("test"),
    }
}
