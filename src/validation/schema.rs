//! Validator shapes and per-value checking.
//!
//! A [`Schema`] is a small tree: a base shape, optionally wrapped by a custom
//! refinement and then by [`Schema::Optional`]. The TypeScript generator walks
//! the same tree, so what the server enforces and what the client ships are
//! built from one value.

use crate::json_helpers::{display_number, number_value, parse_number};
use crate::schema::{Refinement, StringFormat};
use crate::validation::formats;
use base64::Engine as _;
use regex::Regex;
use serde_json::Value;

#[derive(Debug, Clone)]
pub enum Schema {
    String(StringSchema),
    Number(NumberSchema),
    Boolean,
    /// Closed set of option values.
    Enum(Vec<String>),
    File(FileEncoding),
    /// A string holding a JSON document (JSON/JSONB columns).
    JsonText,
    /// A list stored in a `TEXT[]` or `INTEGER[]` column.
    Array(ArrayItem),
    Uuid,
    /// RFC 3339 timestamp, used for the managed timestamp columns.
    Timestamp,
    Refined(Box<Schema>, Refinement),
    Optional(Box<Schema>),
}

#[derive(Debug, Clone, Default)]
pub struct StringSchema {
    pub format: Option<StringFormat>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub pattern: Option<Pattern>,
}

#[derive(Debug, Clone)]
pub struct Pattern {
    pub regex: Regex,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumberSchema {
    pub integer: bool,
    pub positive: bool,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Element type of an array column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayItem {
    Text,
    Integer,
}

/// How a file value travels in the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileEncoding {
    /// Raw bytes as base64 (BYTEA columns).
    Base64,
    /// Stored path or URL; several are joined with `,`.
    Reference,
}

impl Schema {
    pub fn is_optional(&self) -> bool {
        matches!(self, Schema::Optional(_))
    }

    /// The shape under the optional and refinement wrappers.
    pub fn base(&self) -> &Schema {
        match self {
            Schema::Optional(inner) | Schema::Refined(inner, _) => inner.base(),
            other => other,
        }
    }

    /// Check a present, non-null value and return it in canonical form
    /// (numbers and booleans coerced from strings).
    pub fn check(&self, value: &Value) -> Result<Value, String> {
        match self {
            Schema::String(s) => s.check(value),
            Schema::Number(n) => n.check(value),
            Schema::Boolean => check_boolean(value),
            Schema::Enum(options) => {
                let text = expect_str(value)?;
                if options.iter().any(|o| o == text) {
                    Ok(Value::String(text.to_string()))
                } else {
                    Err(format!("Invalid option. Expected one of: {}", options.join(", ")))
                }
            }
            Schema::File(FileEncoding::Base64) => {
                let text = expect_str(value)?;
                base64::engine::general_purpose::STANDARD
                    .decode(text)
                    .map_err(|_| "Must be base64-encoded".to_string())?;
                Ok(Value::String(text.to_string()))
            }
            Schema::File(FileEncoding::Reference) => Ok(Value::String(expect_str(value)?.to_string())),
            Schema::Array(item) => check_array(*item, value),
            Schema::JsonText => {
                let text = expect_str(value)?;
                serde_json::from_str::<Value>(text).map_err(|_| "Must be valid JSON".to_string())?;
                Ok(Value::String(text.to_string()))
            }
            Schema::Uuid => {
                let text = expect_str(value)?;
                uuid::Uuid::parse_str(text).map_err(|_| "Invalid uuid".to_string())?;
                Ok(Value::String(text.to_string()))
            }
            Schema::Timestamp => {
                let text = expect_str(value)?;
                chrono::DateTime::parse_from_rfc3339(text).map_err(|_| "Invalid datetime".to_string())?;
                Ok(Value::String(text.to_string()))
            }
            Schema::Refined(inner, refinement) => {
                let checked = inner.check(value)?;
                if refinement.check(&checked) {
                    Ok(checked)
                } else {
                    Err(refinement.message.clone())
                }
            }
            Schema::Optional(inner) => inner.check(value),
        }
    }
}

impl StringSchema {
    fn check(&self, value: &Value) -> Result<Value, String> {
        let text = expect_str(value)?;
        if let Some(format) = self.format {
            if !formats::is_valid(format, text) {
                return Err(formats::message(format).to_string());
            }
        }
        let len = text.chars().count();
        if let Some(min) = self.min_length {
            if len < min {
                return Err(format!("Must be at least {min} characters"));
            }
        }
        if let Some(max) = self.max_length {
            if len > max {
                return Err(format!("Must be at most {max} characters"));
            }
        }
        if let Some(pattern) = &self.pattern {
            if !pattern.regex.is_match(text) {
                return Err(pattern.message.clone());
            }
        }
        Ok(Value::String(text.to_string()))
    }
}

impl NumberSchema {
    fn check(&self, value: &Value) -> Result<Value, String> {
        let n = parse_number(value).ok_or_else(|| "Expected number".to_string())?;
        if self.integer && n.fract() != 0.0 {
            return Err("Must be an integer".to_string());
        }
        if self.positive && n <= 0.0 {
            return Err("Must be positive".to_string());
        }
        if let Some(min) = self.min {
            if n < min {
                return Err(format!("Must be at least {}", display_number(min)));
            }
        }
        if let Some(max) = self.max {
            if n > max {
                return Err(format!("Must be at most {}", display_number(max)));
            }
        }
        Ok(number_value(n))
    }
}

/// Accepts a JSON array, or a string holding one (multipart fields arrive as
/// text). Elements are checked and normalized one by one.
fn check_array(item: ArrayItem, value: &Value) -> Result<Value, String> {
    let parsed;
    let items = match value {
        Value::Array(items) => items,
        Value::String(text) => {
            parsed = serde_json::from_str::<Value>(text).map_err(|_| "Expected a list".to_string())?;
            parsed.as_array().ok_or_else(|| "Expected a list".to_string())?
        }
        _ => return Err("Expected a list".to_string()),
    };
    items
        .iter()
        .enumerate()
        .map(|(idx, element)| {
            let checked = match item {
                ArrayItem::Text => match element {
                    Value::String(s) => Ok(Value::String(s.clone())),
                    _ => Err("Expected string".to_string()),
                },
                ArrayItem::Integer => match parse_number(element) {
                    Some(n) if n.fract() == 0.0 => Ok(number_value(n)),
                    Some(_) => Err("Must be an integer".to_string()),
                    None => Err("Expected number".to_string()),
                },
            };
            checked.map_err(|e| format!("Item {}: {e}", idx + 1))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Value::Array)
}

fn check_boolean(value: &Value) -> Result<Value, String> {
    let parsed = match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "on" | "1" => Some(true),
            "false" | "off" | "0" => Some(false),
            _ => None,
        },
        Value::Number(n) => match n.as_i64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        _ => None,
    };
    parsed
        .map(Value::Bool)
        .ok_or_else(|| "Expected boolean".to_string())
}

fn expect_str(value: &Value) -> Result<&str, String> {
    value.as_str().ok_or_else(|| "Expected string".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_number_coercion_and_bounds() {
        let schema = Schema::Number(NumberSchema {
            integer: true,
            positive: false,
            min: Some(1.0),
            max: Some(10.0),
        });
        assert_eq!(schema.check(&json!("7")).unwrap(), json!(7));
        assert_eq!(schema.check(&json!(3)).unwrap(), json!(3));
        assert_eq!(schema.check(&json!("2.5")).unwrap_err(), "Must be an integer");
        assert_eq!(schema.check(&json!(0)).unwrap_err(), "Must be at least 1");
        assert_eq!(schema.check(&json!(11)).unwrap_err(), "Must be at most 10");
        assert_eq!(schema.check(&json!("seven")).unwrap_err(), "Expected number");
    }

    #[test]
    fn test_positive() {
        let schema = Schema::Number(NumberSchema {
            positive: true,
            ..NumberSchema::default()
        });
        assert_eq!(schema.check(&json!(0)).unwrap_err(), "Must be positive");
        assert_eq!(schema.check(&json!(0.5)).unwrap(), json!(0.5));
    }

    #[test]
    fn test_boolean_spellings() {
        for (input, expected) in [
            (json!(true), true),
            (json!("on"), true),
            (json!("1"), true),
            (json!("off"), false),
            (json!("FALSE"), false),
            (json!(0), false),
        ] {
            assert_eq!(Schema::Boolean.check(&input).unwrap(), json!(expected), "{input}");
        }
        assert!(Schema::Boolean.check(&json!("yes")).is_err());
    }

    #[test]
    fn test_string_length_and_pattern() {
        let schema = Schema::String(StringSchema {
            format: None,
            min_length: Some(2),
            max_length: Some(4),
            pattern: Some(Pattern {
                regex: Regex::new("^[a-z]+$").unwrap(),
                message: "Lowercase only".to_string(),
            }),
        });
        assert!(schema.check(&json!("abc")).is_ok());
        assert_eq!(schema.check(&json!("a")).unwrap_err(), "Must be at least 2 characters");
        assert_eq!(schema.check(&json!("abcde")).unwrap_err(), "Must be at most 4 characters");
        assert_eq!(schema.check(&json!("AB")).unwrap_err(), "Lowercase only");
        assert_eq!(schema.check(&json!(12)).unwrap_err(), "Expected string");
    }

    #[test]
    fn test_enum_json_base64() {
        let choice = Schema::Enum(vec!["a".to_string(), "b".to_string()]);
        assert!(choice.check(&json!("a")).is_ok());
        assert_eq!(choice.check(&json!("c")).unwrap_err(), "Invalid option. Expected one of: a, b");

        assert!(Schema::JsonText.check(&json!(r#"{"k": [1, 2]}"#)).is_ok());
        assert_eq!(Schema::JsonText.check(&json!("{oops")).unwrap_err(), "Must be valid JSON");

        let file = Schema::File(FileEncoding::Base64);
        assert!(file.check(&json!("aGVsbG8=")).is_ok());
        assert_eq!(file.check(&json!("not base64!")).unwrap_err(), "Must be base64-encoded");
    }

    #[test]
    fn test_refinement_runs_after_base_shape() {
        let schema = Schema::Refined(
            Box::new(Schema::Number(NumberSchema::default())),
            Refinement::new("Must be even", |v| v.as_i64().is_some_and(|n| n % 2 == 0)),
        );
        assert_eq!(schema.check(&json!("4")).unwrap(), json!(4));
        assert_eq!(schema.check(&json!(3)).unwrap_err(), "Must be even");
        assert_eq!(schema.check(&json!("x")).unwrap_err(), "Expected number");
        assert!(matches!(schema.base(), Schema::Number(_)));
    }

    #[test]
    fn test_array_items_are_checked_and_normalized() {
        let tags = Schema::Array(ArrayItem::Text);
        assert_eq!(tags.check(&json!(["a", "b"])).unwrap(), json!(["a", "b"]));
        assert_eq!(tags.check(&json!(r#"["x"]"#)).unwrap(), json!(["x"]));
        assert_eq!(tags.check(&json!(["a", 1])).unwrap_err(), "Item 2: Expected string");
        assert_eq!(tags.check(&json!("a,b")).unwrap_err(), "Expected a list");

        let counts = Schema::Array(ArrayItem::Integer);
        assert_eq!(counts.check(&json!([1, "2"])).unwrap(), json!([1, 2]));
        assert_eq!(counts.check(&json!([1.5])).unwrap_err(), "Item 1: Must be an integer");
    }
}
