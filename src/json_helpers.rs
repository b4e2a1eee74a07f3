//! JSON value helpers shared by the validator and the row decoder.
//!
//! Submitted payloads and decoded rows are both `serde_json::Value`s; these
//! helpers keep number formatting and text rendering identical on both paths.

use serde_json::{Number, Value};

/// Largest integer an IEEE-754 double represents exactly (2^53).
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Convert a float to a JSON number, preferring the integer form when the
/// value is integral and exactly representable.
///
/// # Examples
///
/// ```
/// use formforge::json_helpers::number_value;
/// use serde_json::json;
///
/// assert_eq!(number_value(42.0), json!(42));
/// assert_eq!(number_value(2.5), json!(2.5));
/// assert_eq!(number_value(f64::NAN), json!(null));
/// ```
pub fn number_value(n: f64) -> Value {
    if !n.is_finite() {
        return Value::Null;
    }
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        return Value::Number(Number::from(n as i64));
    }
    Number::from_f64(n).map_or(Value::Null, Value::Number)
}

/// Read a number from a JSON number or a numeric string.
pub fn parse_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

/// Render a value the way it is bound as a text parameter.
///
/// Strings are passed through unquoted, objects and arrays are serialized as
/// JSON text, and `null` has no text form.
pub fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

/// Render a JSON array as a PostgreSQL array literal: `["a", null, 1]`
/// becomes `{"a",NULL,"1"}`. Every element is quoted so the cast to the
/// element type does the parsing.
pub fn pg_array_literal(items: &[Value]) -> String {
    let elements: Vec<String> = items
        .iter()
        .map(|item| match value_as_text(item) {
            None => "NULL".to_string(),
            Some(text) => format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\"")),
        })
        .collect();
    format!("{{{}}}", elements.join(","))
}

/// Format a bound for messages: `5` rather than `5.0`.
pub fn display_number(n: f64) -> String {
    match number_value(n) {
        Value::Number(num) => num.to_string(),
        _ => n.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_number_value_integral() {
        assert_eq!(number_value(0.0), json!(0));
        assert_eq!(number_value(-17.0), json!(-17));
        assert!(number_value(1e300).is_f64());
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number(&json!("  3.5 ")), Some(3.5));
        assert_eq!(parse_number(&json!(7)), Some(7.0));
        assert_eq!(parse_number(&json!("abc")), None);
        assert_eq!(parse_number(&json!("inf")), None);
        assert_eq!(parse_number(&json!(true)), None);
    }

    #[test]
    fn test_value_as_text() {
        assert_eq!(value_as_text(&json!("it's")), Some("it's".to_string()));
        assert_eq!(value_as_text(&json!(false)), Some("false".to_string()));
        assert_eq!(value_as_text(&json!({"a": 1})), Some(r#"{"a":1}"#.to_string()));
        assert_eq!(value_as_text(&Value::Null), None);
    }

    #[test]
    fn test_display_number() {
        assert_eq!(display_number(5.0), "5");
        assert_eq!(display_number(0.25), "0.25");
    }

    #[test]
    fn test_pg_array_literal_quotes_and_escapes() {
        assert_eq!(pg_array_literal(&[]), "{}");
        assert_eq!(pg_array_literal(&[json!("a"), json!(null), json!(7)]), r#"{"a",NULL,"7"}"#);
        assert_eq!(
            pg_array_literal(&[json!(r#"say "hi""#), json!(r"c:\tmp"), json!("x,y")]),
            r#"{"say \"hi\"","c:\\tmp","x,y"}"#
        );
    }
}
