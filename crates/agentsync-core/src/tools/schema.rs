use crate::error::AgentSyncError;
use serde_json::Value;

/// Checks tool arguments against the subset of JSON Schema tools declare:
/// an object with typed `properties` and a `required` list.
/// Undeclared extra properties are allowed.
pub fn validate_arguments(tool: &str, schema: &Value, args: &Value) -> Result<(), AgentSyncError> {
    let args = args
        .as_object()
        .ok_or_else(|| AgentSyncError::invalid_args(tool, "arguments must be a JSON object"))?;

    if let Some(required) = schema.get("required").and_then(|r| r.as_array()) {
        for name in required.iter().filter_map(|n| n.as_str()) {
            if args.get(name).map_or(true, Value::is_null) {
                return Err(AgentSyncError::invalid_args(
                    tool,
                    format!("missing required parameter: {name}"),
                ));
            }
        }
    }

    let Some(properties) = schema.get("properties").and_then(|p| p.as_object()) else {
        return Ok(());
    };

    for (name, value) in args {
        if value.is_null() {
            continue;
        }
        let Some(declared) = properties.get(name) else {
            continue;
        };
        if let Some(expected) = declared.get("type").and_then(|t| t.as_str()) {
            if !matches_type(expected, value) {
                return Err(AgentSyncError::invalid_args(
                    tool,
                    format!("parameter '{name}' must be of type {expected}"),
                ));
            }
        }
        if let (Some(items), Some(item_type)) = (
            value.as_array(),
            declared.pointer("/items/type").and_then(|t| t.as_str()),
        ) {
            if let Some(pos) = items.iter().position(|item| !matches_type(item_type, item)) {
                return Err(AgentSyncError::invalid_args(
                    tool,
                    format!("parameter '{name}[{pos}]' must be of type {item_type}"),
                ));
            }
        }
    }

    Ok(())
}

fn matches_type(expected: &str, value: &Value) -> bool {
    match expected {
        "string" => value.is_string(),
        "integer" => value.is_i64() || value.is_u64(),
        "number" => value.is_number(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn email_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "recipient": {"type": "string"},
                "subject": {"type": "string"},
                "count": {"type": "integer"},
                "attendees": {"type": "array", "items": {"type": "string"}}
            },
            "required": ["recipient", "subject"]
        })
    }

    #[test]
    fn accepts_valid_arguments() {
        let args = json!({"recipient": "a@b.com", "subject": "Hi", "count": 2, "extra": true});
        assert!(validate_arguments("send_email", &email_schema(), &args).is_ok());
    }

    #[test]
    fn rejects_missing_required() {
        let args = json!({"recipient": "a@b.com"});
        let err = validate_arguments("send_email", &email_schema(), &args).unwrap_err();
        assert!(err.to_string().contains("missing required parameter: subject"));
    }

    #[test]
    fn rejects_null_required() {
        let args = json!({"recipient": "a@b.com", "subject": null});
        assert!(validate_arguments("send_email", &email_schema(), &args).is_err());
    }

    #[test]
    fn rejects_wrong_types() {
        let args = json!({"recipient": 42, "subject": "Hi"});
        let err = validate_arguments("send_email", &email_schema(), &args).unwrap_err();
        assert!(matches!(err, AgentSyncError::InvalidArguments { .. }));

        let args = json!({"recipient": "a", "subject": "Hi", "count": 1.5});
        assert!(validate_arguments("send_email", &email_schema(), &args).is_err());

        let args = json!({"recipient": "a", "subject": "Hi", "attendees": ["x", 3]});
        let err = validate_arguments("send_email", &email_schema(), &args).unwrap_err();
        assert!(err.to_string().contains("attendees[1]"));
    }

    #[test]
    fn rejects_non_object() {
        assert!(validate_arguments("t", &email_schema(), &json!("text")).is_err());
    }
}
