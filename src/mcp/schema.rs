//! Tool input schemas and argument validation
//!
//! A [`ToolSchema`] is a closed description of a tool's arguments. The same
//! description is published through `tools/list` as JSON Schema and used by
//! [`validate`] to check and normalize incoming arguments, so the two cannot
//! drift apart.

use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};

use crate::error::ValidationError;

/// Kind and constraints of a single argument
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// Free text, trimmed before the length check
    Text { min_len: usize, max_len: usize },

    /// Case-insensitive identifier, trimmed and lower-cased
    Identifier { max_len: usize },

    /// One of a fixed set of strings
    Choice {
        values: &'static [&'static str],
        default: Option<&'static str>,
    },

    /// Integer within an inclusive range; out-of-range values are rejected
    Integer { min: i64, max: i64, default: i64 },

    /// Boolean flag
    Flag { default: bool },

    /// List of case-insensitive identifiers
    IdentifierList {
        min_items: usize,
        max_items: usize,
        max_len: usize,
    },
}

/// One declared argument
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub required: bool,
    pub kind: FieldKind,
}

impl FieldSpec {
    /// Optional free-text field
    pub fn text(name: &'static str, description: &'static str, max_len: usize) -> Self {
        Self {
            name,
            description,
            required: false,
            kind: FieldKind::Text { min_len: 0, max_len },
        }
    }

    /// Optional region-style identifier
    pub fn identifier(name: &'static str, description: &'static str, max_len: usize) -> Self {
        Self {
            name,
            description,
            required: false,
            kind: FieldKind::Identifier { max_len },
        }
    }

    /// Optional enumerated field
    pub fn choice(
        name: &'static str,
        description: &'static str,
        values: &'static [&'static str],
        default: Option<&'static str>,
    ) -> Self {
        Self {
            name,
            description,
            required: false,
            kind: FieldKind::Choice { values, default },
        }
    }

    /// Optional bounded integer
    pub fn integer(
        name: &'static str,
        description: &'static str,
        min: i64,
        max: i64,
        default: i64,
    ) -> Self {
        Self {
            name,
            description,
            required: false,
            kind: FieldKind::Integer { min, max, default },
        }
    }

    /// Optional boolean
    pub fn flag(name: &'static str, description: &'static str, default: bool) -> Self {
        Self {
            name,
            description,
            required: false,
            kind: FieldKind::Flag { default },
        }
    }

    /// Optional identifier list
    pub fn identifier_list(
        name: &'static str,
        description: &'static str,
        min_items: usize,
        max_items: usize,
        max_len: usize,
    ) -> Self {
        Self {
            name,
            description,
            required: false,
            kind: FieldKind::IdentifierList {
                min_items,
                max_items,
                max_len,
            },
        }
    }

    /// Mark the field as required; required text must be non-empty
    pub fn required(mut self) -> Self {
        self.required = true;
        if let FieldKind::Text { min_len, .. } = &mut self.kind {
            *min_len = (*min_len).max(1);
        }
        self
    }

    /// JSON Schema for this field
    fn to_json(&self) -> Value {
        let mut schema = match &self.kind {
            FieldKind::Text { min_len, max_len } => {
                let mut s = json!({"type": "string", "maxLength": max_len});
                if *min_len > 0 {
                    s["minLength"] = json!(min_len);
                }
                s
            }
            FieldKind::Identifier { max_len } => json!({"type": "string", "maxLength": max_len}),
            FieldKind::Choice { values, default } => {
                let mut s = json!({"type": "string", "enum": values});
                if let Some(d) = default {
                    s["default"] = json!(d);
                }
                s
            }
            FieldKind::Integer { min, max, default } => json!({
                "type": "integer",
                "minimum": min,
                "maximum": max,
                "default": default
            }),
            FieldKind::Flag { default } => json!({"type": "boolean", "default": default}),
            FieldKind::IdentifierList {
                min_items,
                max_items,
                max_len,
            } => json!({
                "type": "array",
                "items": {"type": "string", "minLength": 1, "maxLength": max_len},
                "minItems": min_items,
                "maxItems": max_items
            }),
        };
        schema["description"] = json!(self.description);
        schema
    }
}

/// Closed schema for a tool's arguments
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ToolSchema {
    fields: Vec<FieldSpec>,
}

impl ToolSchema {
    /// Create a schema from its fields, in display order
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    /// Declared fields
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// JSON Schema published through `tools/list`
    pub fn to_json(&self) -> Value {
        let properties: Map<String, Value> = self
            .fields
            .iter()
            .map(|f| (f.name.to_string(), f.to_json()))
            .collect();
        let required: Vec<&str> = self
            .fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name)
            .collect();

        let mut schema = json!({
            "type": "object",
            "properties": properties,
            "additionalProperties": false
        });
        if !required.is_empty() {
            schema["required"] = json!(required);
        }
        schema
    }
}

/// Arguments that passed validation, with strings trimmed and identifiers lower-cased
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValidInput {
    values: Map<String, Value>,
}

impl ValidInput {
    /// Normalized argument map
    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Deserialize into a tool's typed arguments
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, ValidationError> {
        serde_json::from_value(Value::Object(self.values.clone())).map_err(|e| {
            ValidationError::InvalidParameter {
                name: "arguments".to_string(),
                message: e.to_string(),
            }
        })
    }
}

/// Validate raw arguments against a schema
///
/// Absent and `null` arguments are treated as an empty object. Unknown fields
/// are rejected, required fields must be present, and optional text that is
/// empty after trimming is dropped as if it had not been sent.
pub fn validate(schema: &ToolSchema, raw: &Value) -> Result<ValidInput, ValidationError> {
    let empty = Map::new();
    let args = match raw {
        Value::Null => &empty,
        Value::Object(map) => map,
        other => {
            return Err(ValidationError::InvalidParameter {
                name: "arguments".to_string(),
                message: format!("expected an object, got {}", type_name(other)),
            })
        }
    };

    let mut unknown: Vec<&str> = args
        .keys()
        .map(String::as_str)
        .filter(|key| schema.field(key).is_none())
        .collect();
    if !unknown.is_empty() {
        unknown.sort_unstable();
        return Err(ValidationError::UnknownField {
            field: unknown.join(", "),
        });
    }

    let mut values = Map::new();

    for field in &schema.fields {
        let value = match args.get(field.name) {
            None | Some(Value::Null) => {
                if field.required {
                    return Err(ValidationError::MissingField {
                        field: field.name.to_string(),
                    });
                }
                continue;
            }
            Some(value) => value,
        };

        if let Some(normalized) = check_field(field, value)? {
            values.insert(field.name.to_string(), normalized);
        } else if field.required {
            return Err(ValidationError::MissingField {
                field: field.name.to_string(),
            });
        }
    }

    Ok(ValidInput { values })
}

/// Check one present value; `Ok(None)` means "treat as absent"
fn check_field(field: &FieldSpec, value: &Value) -> Result<Option<Value>, ValidationError> {
    let invalid = |message: String| ValidationError::InvalidParameter {
        name: field.name.to_string(),
        message,
    };

    match &field.kind {
        FieldKind::Text { min_len, max_len } => {
            let text = expect_str(field, value)?.trim();
            if text.is_empty() && !field.required {
                return Ok(None);
            }
            check_length(field, text, *min_len, *max_len)?;
            Ok(Some(Value::String(text.to_string())))
        }
        FieldKind::Identifier { max_len } => {
            let text = expect_str(field, value)?.trim().to_lowercase();
            if text.is_empty() && !field.required {
                return Ok(None);
            }
            check_length(field, &text, 1, *max_len)?;
            Ok(Some(Value::String(text)))
        }
        FieldKind::Choice { values, .. } => {
            let text = expect_str(field, value)?.trim();
            if values.contains(&text) {
                Ok(Some(Value::String(text.to_string())))
            } else {
                Err(invalid(format!("must be one of: {}", values.join(", "))))
            }
        }
        FieldKind::Integer { min, max, .. } => {
            let number = as_integer(value)
                .ok_or_else(|| invalid(format!("expected an integer, got {}", value)))?;
            if number < *min || number > *max {
                return Err(invalid(format!(
                    "must be between {} and {}, got {}",
                    min, max, number
                )));
            }
            Ok(Some(json!(number)))
        }
        FieldKind::Flag { .. } => match value {
            Value::Bool(b) => Ok(Some(Value::Bool(*b))),
            other => Err(invalid(format!("expected a boolean, got {}", type_name(other)))),
        },
        FieldKind::IdentifierList {
            min_items,
            max_items,
            max_len,
        } => {
            let items = value
                .as_array()
                .ok_or_else(|| invalid(format!("expected an array, got {}", type_name(value))))?;

            let mut normalized = Vec::with_capacity(items.len());
            for item in items {
                let text = item
                    .as_str()
                    .ok_or_else(|| invalid("every entry must be a string".to_string()))?
                    .trim()
                    .to_lowercase();
                if text.is_empty() {
                    return Err(invalid("entries must not be empty".to_string()));
                }
                if text.chars().count() > *max_len {
                    return Err(invalid(format!(
                        "entries must be at most {} characters",
                        max_len
                    )));
                }
                normalized.push(Value::String(text));
            }

            if normalized.len() < *min_items {
                return Err(invalid(format!(
                    "at least {} entries required, got {}",
                    min_items,
                    normalized.len()
                )));
            }
            if normalized.len() > *max_items {
                return Err(invalid(format!(
                    "at most {} entries allowed, got {}",
                    max_items,
                    normalized.len()
                )));
            }
            Ok(Some(Value::Array(normalized)))
        }
    }
}

fn expect_str<'v>(field: &FieldSpec, value: &'v Value) -> Result<&'v str, ValidationError> {
    value
        .as_str()
        .ok_or_else(|| ValidationError::InvalidParameter {
            name: field.name.to_string(),
            message: format!("expected a string, got {}", type_name(value)),
        })
}

fn check_length(
    field: &FieldSpec,
    text: &str,
    min_len: usize,
    max_len: usize,
) -> Result<(), ValidationError> {
    let len = text.chars().count();
    if len < min_len || len > max_len {
        return Err(ValidationError::InvalidParameter {
            name: field.name.to_string(),
            message: format!(
                "length must be between {} and {} characters, got {}",
                min_len, max_len, len
            ),
        });
    }
    Ok(())
}

/// Integers, including floats with no fractional part
fn as_integer(value: &Value) -> Option<i64> {
    if let Some(n) = value.as_i64() {
        return Some(n);
    }
    let f = value.as_f64()?;
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORMATS: &[&str] = &["markdown", "json"];

    fn schema() -> ToolSchema {
        ToolSchema::new(vec![
            FieldSpec::text("service_name", "Service", 100).required(),
            FieldSpec::identifier("region", "Region", 50),
            FieldSpec::choice("response_format", "Format", FORMATS, Some("markdown")),
            FieldSpec::integer("limit", "Limit", 1, 1000, 100),
            FieldSpec::flag("include_savings_plans", "Savings", true),
            FieldSpec::identifier_list("regions", "Regions", 2, 10, 50),
        ])
    }

    #[test]
    fn test_valid_input_is_normalized() {
        let raw = json!({
            "service_name": "  Virtual Machines ",
            "region": " EastUS ",
            "limit": 10,
            "regions": [" WestEurope", "UKSouth "]
        });
        let input = validate(&schema(), &raw).unwrap();
        assert_eq!(input.values()["service_name"], "Virtual Machines");
        assert_eq!(input.values()["region"], "eastus");
        assert_eq!(input.values()["regions"], json!(["westeurope", "uksouth"]));
        assert!(!input.values().contains_key("response_format"));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let raw = json!({"service_name": "Storage", "colour": "blue"});
        let err = validate(&schema(), &raw).unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnknownField {
                field: "colour".to_string()
            }
        );
    }

    #[test]
    fn test_missing_required_field() {
        let err = validate(&schema(), &json!({})).unwrap_err();
        assert_eq!(err.field(), "service_name");

        let err = validate(&schema(), &json!({"service_name": "   "})).unwrap_err();
        assert_eq!(err.field(), "service_name");

        let err = validate(&schema(), &Value::Null).unwrap_err();
        assert!(matches!(err, ValidationError::MissingField { .. }));
    }

    #[test]
    fn test_choice_outside_enumeration() {
        let raw = json!({"service_name": "Storage", "response_format": "xml"});
        let err = validate(&schema(), &raw).unwrap_err();
        assert_eq!(err.field(), "response_format");
        assert!(err.to_string().contains("markdown, json"));
    }

    #[test]
    fn test_integer_out_of_range_is_rejected_not_clamped() {
        for limit in [0, 1001, -5] {
            let raw = json!({"service_name": "Storage", "limit": limit});
            let err = validate(&schema(), &raw).unwrap_err();
            assert_eq!(err.field(), "limit");
        }

        let raw = json!({"service_name": "Storage", "limit": 1000.0});
        assert_eq!(validate(&schema(), &raw).unwrap().values()["limit"], 1000);

        let raw = json!({"service_name": "Storage", "limit": 2.5});
        assert!(validate(&schema(), &raw).is_err());
    }

    #[test]
    fn test_identifier_list_minimum() {
        let raw = json!({"service_name": "Storage", "regions": ["eastus"]});
        let err = validate(&schema(), &raw).unwrap_err();
        assert_eq!(err.field(), "regions");
        assert!(err.to_string().contains("at least 2"));
    }

    #[test]
    fn test_text_length_after_trim() {
        let long = format!("  {}  ", "a".repeat(100));
        let raw = json!({"service_name": long});
        assert!(validate(&schema(), &raw).is_ok());

        let raw = json!({"service_name": "a".repeat(101)});
        assert!(validate(&schema(), &raw).is_err());
    }

    #[test]
    fn test_wrong_types() {
        let raw = json!({"service_name": 42});
        assert_eq!(validate(&schema(), &raw).unwrap_err().field(), "service_name");

        let raw = json!({"service_name": "Storage", "include_savings_plans": "yes"});
        assert_eq!(
            validate(&schema(), &raw).unwrap_err().field(),
            "include_savings_plans"
        );

        let err = validate(&schema(), &json!(["not", "an", "object"])).unwrap_err();
        assert_eq!(err.field(), "arguments");
    }

    #[test]
    fn test_schema_json() {
        let value = schema().to_json();
        assert_eq!(value["type"], "object");
        assert_eq!(value["additionalProperties"], false);
        assert_eq!(value["required"], json!(["service_name"]));
        assert_eq!(value["properties"]["service_name"]["minLength"], 1);
        assert_eq!(value["properties"]["limit"]["maximum"], 1000);
        assert_eq!(value["properties"]["regions"]["minItems"], 2);
        assert_eq!(value["properties"]["response_format"]["enum"], json!(FORMATS));
    }
}
