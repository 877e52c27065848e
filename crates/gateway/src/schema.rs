use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// One field-level validation failure: which field, which rule, and the
/// constraint value that was violated (when the rule has one).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub rule: String,
    pub constraint: Option<Value>,
}

impl FieldViolation {
    fn new(field: impl Into<String>, rule: &str, constraint: Option<Value>) -> Self {
        Self {
            field: field.into(),
            rule: rule.to_string(),
            constraint,
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = if self.field.is_empty() { "$" } else { &self.field };
        match &self.constraint {
            Some(constraint) => write!(f, "{}: {} ({})", field, self.rule, constraint),
            None => write!(f, "{}: {}", field, self.rule),
        }
    }
}

/// Validate `args` against a JSON-Schema-like object shape.
///
/// Enforced rules: `required`, declared-property membership (unknown fields
/// are rejected unless the schema sets `"additionalProperties": true`),
/// `type`, numeric `minimum`/`maximum`, string `minLength`/`maxLength`,
/// `enum`, and nested objects with dotted field paths. All violations are
/// collected, not just the first.
pub fn validate(
    schema: &Value,
    args: &Map<String, Value>,
) -> Result<Map<String, Value>, Vec<FieldViolation>> {
    let mut violations = Vec::new();

    if let Some(schema_obj) = schema.as_object() {
        validate_object(schema_obj, args, "", &mut violations);
    }

    if violations.is_empty() {
        Ok(args.clone())
    } else {
        Err(violations)
    }
}

fn validate_object(
    schema: &Map<String, Value>,
    args: &Map<String, Value>,
    prefix: &str,
    out: &mut Vec<FieldViolation>,
) {
    let properties = schema
        .get("properties")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    if let Some(required) = schema.get("required").and_then(Value::as_array) {
        for name in required.iter().filter_map(Value::as_str) {
            if !args.contains_key(name) {
                out.push(FieldViolation::new(
                    format!("{prefix}{name}"),
                    "required",
                    None,
                ));
            }
        }
    }

    let allow_unknown = schema
        .get("additionalProperties")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    for (name, value) in args {
        let path = format!("{prefix}{name}");
        match properties.get(name) {
            Some(prop_schema) => validate_value(prop_schema, value, &path, out),
            None if allow_unknown => {}
            None => out.push(FieldViolation::new(path, "unknown_field", None)),
        }
    }
}

fn validate_value(prop_schema: &Value, value: &Value, path: &str, out: &mut Vec<FieldViolation>) {
    let Some(prop) = prop_schema.as_object() else {
        return;
    };

    if let Some(expected) = prop.get("type").and_then(Value::as_str) {
        if !type_matches(expected, value) {
            out.push(FieldViolation::new(
                path,
                "type",
                Some(Value::String(expected.to_string())),
            ));
            // Range/length checks are meaningless on the wrong type.
            return;
        }
    }

    if let Some(minimum) = prop.get("minimum").and_then(Value::as_f64) {
        if let Some(n) = value.as_f64() {
            if n < minimum {
                out.push(FieldViolation::new(
                    path,
                    "minimum",
                    prop.get("minimum").cloned(),
                ));
            }
        }
    }

    if let Some(maximum) = prop.get("maximum").and_then(Value::as_f64) {
        if let Some(n) = value.as_f64() {
            if n > maximum {
                out.push(FieldViolation::new(
                    path,
                    "maximum",
                    prop.get("maximum").cloned(),
                ));
            }
        }
    }

    if let Some(min_len) = prop.get("minLength").and_then(Value::as_u64) {
        if let Some(s) = value.as_str() {
            if (s.chars().count() as u64) < min_len {
                out.push(FieldViolation::new(
                    path,
                    "minLength",
                    prop.get("minLength").cloned(),
                ));
            }
        }
    }

    if let Some(max_len) = prop.get("maxLength").and_then(Value::as_u64) {
        if let Some(s) = value.as_str() {
            if (s.chars().count() as u64) > max_len {
                out.push(FieldViolation::new(
                    path,
                    "maxLength",
                    prop.get("maxLength").cloned(),
                ));
            }
        }
    }

    if let Some(allowed) = prop.get("enum").and_then(Value::as_array) {
        if !allowed.contains(value) {
            out.push(FieldViolation::new(path, "enum", prop.get("enum").cloned()));
        }
    }

    // Nested objects validate recursively with dotted paths.
    if let (Some(obj), true) = (value.as_object(), prop.contains_key("properties")) {
        validate_object(prop, obj, &format!("{path}."), out);
    }
}

fn type_matches(expected: &str, value: &Value) -> bool {
    match expected {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.as_i64().is_some() || value.as_u64().is_some(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        // Unknown type keyword: pass rather than reject valid input.
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    fn invoice_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "invoiceId": {"type": "string", "minLength": 1},
                "amount": {"type": "number", "minimum": 0, "maximum": 10000},
                "copies": {"type": "integer", "minimum": 1},
                "status": {"type": "string", "enum": ["draft", "sent"]}
            },
            "required": ["invoiceId"]
        })
    }

    #[test]
    fn valid_args_pass_through() {
        let out = validate(
            &invoice_schema(),
            &args(json!({"invoiceId": "INV-1", "amount": 120.5})),
        )
        .unwrap();
        assert_eq!(out.get("invoiceId"), Some(&json!("INV-1")));
    }

    #[test]
    fn missing_required_field() {
        let errs = validate(&invoice_schema(), &args(json!({}))).unwrap_err();
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].field, "invoiceId");
        assert_eq!(errs[0].rule, "required");
    }

    #[test]
    fn unknown_field_rejected() {
        let errs = validate(
            &invoice_schema(),
            &args(json!({"invoiceId": "INV-1", "surprise": true})),
        )
        .unwrap_err();
        assert_eq!(errs[0].field, "surprise");
        assert_eq!(errs[0].rule, "unknown_field");
    }

    #[test]
    fn additional_properties_true_allows_unknown_fields() {
        let schema = json!({"type": "object", "properties": {}, "additionalProperties": true});
        assert!(validate(&schema, &args(json!({"anything": 1}))).is_ok());
    }

    #[test]
    fn wrong_type_reported_once() {
        let errs = validate(
            &invoice_schema(),
            &args(json!({"invoiceId": 42})),
        )
        .unwrap_err();
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].rule, "type");
        assert_eq!(errs[0].constraint, Some(json!("string")));
    }

    #[test]
    fn integer_rejects_fractional() {
        let errs = validate(
            &invoice_schema(),
            &args(json!({"invoiceId": "INV-1", "copies": 1.5})),
        )
        .unwrap_err();
        assert_eq!(errs[0].field, "copies");
        assert_eq!(errs[0].rule, "type");
    }

    #[test]
    fn numeric_range_enforced() {
        let errs = validate(
            &invoice_schema(),
            &args(json!({"invoiceId": "INV-1", "amount": -5})),
        )
        .unwrap_err();
        assert_eq!(errs[0].rule, "minimum");
        assert_eq!(errs[0].constraint, Some(json!(0)));

        let errs = validate(
            &invoice_schema(),
            &args(json!({"invoiceId": "INV-1", "amount": 20000})),
        )
        .unwrap_err();
        assert_eq!(errs[0].rule, "maximum");
    }

    #[test]
    fn string_length_enforced() {
        let errs = validate(
            &invoice_schema(),
            &args(json!({"invoiceId": ""})),
        )
        .unwrap_err();
        assert_eq!(errs[0].rule, "minLength");
    }

    #[test]
    fn enum_enforced() {
        let errs = validate(
            &invoice_schema(),
            &args(json!({"invoiceId": "INV-1", "status": "archived"})),
        )
        .unwrap_err();
        assert_eq!(errs[0].field, "status");
        assert_eq!(errs[0].rule, "enum");
    }

    #[test]
    fn all_violations_collected() {
        let errs = validate(
            &invoice_schema(),
            &args(json!({"amount": -1, "surprise": true})),
        )
        .unwrap_err();
        let rules: Vec<&str> = errs.iter().map(|v| v.rule.as_str()).collect();
        assert!(rules.contains(&"required"));
        assert!(rules.contains(&"minimum"));
        assert!(rules.contains(&"unknown_field"));
    }

    #[test]
    fn nested_object_paths_are_dotted() {
        let schema = json!({
            "type": "object",
            "properties": {
                "recipient": {
                    "type": "object",
                    "properties": {
                        "email": {"type": "string", "minLength": 3}
                    },
                    "required": ["email"]
                }
            },
            "required": ["recipient"]
        });
        let errs = validate(&schema, &args(json!({"recipient": {}}))).unwrap_err();
        assert_eq!(errs[0].field, "recipient.email");
        assert_eq!(errs[0].rule, "required");
    }

    #[test]
    fn violation_display_includes_constraint() {
        let v = FieldViolation::new("amount", "maximum", Some(json!(10000)));
        assert_eq!(v.to_string(), "amount: maximum (10000)");
    }
}
