//! PostgreSQL column types and default-value literals.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// SQL types a field can be stored as.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PgType {
    Text,
    Varchar,
    Char,
    SmallInt,
    Integer,
    BigInt,
    Numeric,
    Decimal,
    Real,
    DoublePrecision,
    Boolean,
    Date,
    Time,
    Timestamp,
    Timestamptz,
    Uuid,
    Json,
    Jsonb,
    Bytea,
    TextArray,
    IntegerArray,
    /// Anything else is passed through verbatim.
    Other(String),
}

/// Coarse grouping used for default literals, casts and consistency checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    Text,
    Numeric,
    Boolean,
    Temporal,
    Uuid,
    Json,
    Binary,
    Array,
    Other,
}

impl PgType {
    pub fn category(&self) -> TypeCategory {
        match self {
            PgType::Text | PgType::Varchar | PgType::Char => TypeCategory::Text,
            PgType::SmallInt
            | PgType::Integer
            | PgType::BigInt
            | PgType::Numeric
            | PgType::Decimal
            | PgType::Real
            | PgType::DoublePrecision => TypeCategory::Numeric,
            PgType::Boolean => TypeCategory::Boolean,
            PgType::Date | PgType::Time | PgType::Timestamp | PgType::Timestamptz => {
                TypeCategory::Temporal
            }
            PgType::Uuid => TypeCategory::Uuid,
            PgType::Json | PgType::Jsonb => TypeCategory::Json,
            PgType::Bytea => TypeCategory::Binary,
            PgType::TextArray | PgType::IntegerArray => TypeCategory::Array,
            PgType::Other(_) => TypeCategory::Other,
        }
    }

    pub fn is_json(&self) -> bool {
        self.category() == TypeCategory::Json
    }

    /// `SMALLINT`, `INTEGER` or `BIGINT`: fractional input fails the cast.
    pub fn is_integer(&self) -> bool {
        matches!(self, PgType::SmallInt | PgType::Integer | PgType::BigInt)
    }

    /// Type name without modifiers, as used in `CAST(... AS <name>)`.
    pub fn base_name(&self) -> &str {
        match self {
            PgType::Text => "TEXT",
            PgType::Varchar => "VARCHAR",
            PgType::Char => "CHAR",
            PgType::SmallInt => "SMALLINT",
            PgType::Integer => "INTEGER",
            PgType::BigInt => "BIGINT",
            PgType::Numeric => "NUMERIC",
            PgType::Decimal => "DECIMAL",
            PgType::Real => "REAL",
            PgType::DoublePrecision => "DOUBLE PRECISION",
            PgType::Boolean => "BOOLEAN",
            PgType::Date => "DATE",
            PgType::Time => "TIME",
            PgType::Timestamp => "TIMESTAMP",
            PgType::Timestamptz => "TIMESTAMPTZ",
            PgType::Uuid => "UUID",
            PgType::Json => "JSON",
            PgType::Jsonb => "JSONB",
            PgType::Bytea => "BYTEA",
            PgType::TextArray => "TEXT[]",
            PgType::IntegerArray => "INTEGER[]",
            PgType::Other(name) => name,
        }
    }
}

impl FromStr for PgType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().split_whitespace().collect::<Vec<_>>().join(" ");
        if normalized.is_empty() {
            return Err("SQL type must not be empty".to_string());
        }
        Ok(match normalized.as_str() {
            "TEXT" => PgType::Text,
            "VARCHAR" | "CHARACTER VARYING" => PgType::Varchar,
            "CHAR" | "CHARACTER" => PgType::Char,
            "SMALLINT" | "INT2" => PgType::SmallInt,
            "INTEGER" | "INT" | "INT4" => PgType::Integer,
            "BIGINT" | "INT8" => PgType::BigInt,
            "NUMERIC" => PgType::Numeric,
            "DECIMAL" => PgType::Decimal,
            "REAL" | "FLOAT4" => PgType::Real,
            "DOUBLE PRECISION" | "FLOAT8" => PgType::DoublePrecision,
            "BOOLEAN" | "BOOL" => PgType::Boolean,
            "DATE" => PgType::Date,
            "TIME" => PgType::Time,
            "TIMESTAMP" => PgType::Timestamp,
            "TIMESTAMPTZ" | "TIMESTAMP WITH TIME ZONE" => PgType::Timestamptz,
            "UUID" => PgType::Uuid,
            "JSON" => PgType::Json,
            "JSONB" => PgType::Jsonb,
            "BYTEA" => PgType::Bytea,
            "TEXT[]" => PgType::TextArray,
            "INTEGER[]" | "INT[]" => PgType::IntegerArray,
            _ => PgType::Other(normalized),
        })
    }
}

impl TryFrom<String> for PgType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PgType> for String {
    fn from(value: PgType) -> Self {
        value.base_name().to_string()
    }
}

impl fmt::Display for PgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.base_name())
    }
}

/// A resolved column type: base type plus length/precision modifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnType {
    pub pg_type: PgType,
    pub length: Option<u32>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
}

impl ColumnType {
    pub const fn of(pg_type: PgType) -> Self {
        Self {
            pg_type,
            length: None,
            precision: None,
            scale: None,
        }
    }

    pub const fn with_length(pg_type: PgType, length: u32) -> Self {
        Self {
            pg_type,
            length: Some(length),
            precision: None,
            scale: None,
        }
    }

    pub fn category(&self) -> TypeCategory {
        self.pg_type.category()
    }

    /// Full SQL type as written in a column definition, e.g. `VARCHAR(255)`.
    pub fn sql(&self) -> String {
        match self.pg_type {
            PgType::Varchar => format!("VARCHAR({})", self.length.unwrap_or(255)),
            PgType::Char => format!("CHAR({})", self.length.unwrap_or(1)),
            PgType::Numeric | PgType::Decimal => match (self.precision, self.scale) {
                (Some(p), Some(s)) => format!("{}({}, {})", self.pg_type.base_name(), p, s),
                (Some(p), None) => format!("{}({})", self.pg_type.base_name(), p),
                _ => self.pg_type.base_name().to_string(),
            },
            _ => self.pg_type.base_name().to_string(),
        }
    }

    /// Type name for casting bound text parameters. Modifiers are left off so
    /// that overlong values fail on assignment instead of being truncated.
    pub fn cast_name(&self) -> String {
        self.pg_type.base_name().to_ascii_lowercase()
    }

    /// Render a `DEFAULT` literal for this column.
    pub fn default_literal(&self, value: &Value) -> String {
        if value.is_null() {
            return "NULL".to_string();
        }
        match self.category() {
            TypeCategory::Numeric => match value {
                Value::Number(n) => n.to_string(),
                Value::String(s) if s.trim().parse::<f64>().is_ok() => s.trim().to_string(),
                other => quote_literal(&plain_text(other)),
            },
            TypeCategory::Boolean => match value {
                Value::Bool(b) => b.to_string(),
                Value::String(s) if matches!(s.to_ascii_lowercase().as_str(), "true" | "false") => {
                    s.to_ascii_lowercase()
                }
                other => quote_literal(&plain_text(other)),
            },
            TypeCategory::Json => {
                let json = match value {
                    Value::String(s) if serde_json::from_str::<Value>(s).is_ok() => s.clone(),
                    other => other.to_string(),
                };
                format!("{}::{}", quote_literal(&json), self.cast_name())
            }
            TypeCategory::Array => match value {
                Value::Array(items) if items.is_empty() => format!("ARRAY[]::{}", self.cast_name()),
                Value::Array(items) => {
                    let rendered: Vec<String> = items
                        .iter()
                        .map(|item| match item {
                            Value::Number(n) => n.to_string(),
                            Value::Bool(b) => b.to_string(),
                            other => quote_literal(&plain_text(other)),
                        })
                        .collect();
                    format!("ARRAY[{}]", rendered.join(", "))
                }
                other => quote_literal(&plain_text(other)),
            },
            TypeCategory::Uuid | TypeCategory::Temporal => match value {
                Value::String(s) if is_sql_function(s) => s.trim().to_string(),
                other => quote_literal(&plain_text(other)),
            },
            TypeCategory::Text | TypeCategory::Binary | TypeCategory::Other => {
                quote_literal(&plain_text(value))
            }
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql())
    }
}

/// Single-quote a SQL string literal, doubling embedded quotes.
pub fn quote_literal(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

fn plain_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `gen_random_uuid()`, `now()`, `CURRENT_TIMESTAMP` and friends.
fn is_sql_function(s: &str) -> bool {
    let s = s.trim();
    let upper = s.to_ascii_uppercase();
    let is_call = s.ends_with("()")
        && s[..s.len() - 2]
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    is_call || matches!(upper.as_str(), "CURRENT_DATE" | "CURRENT_TIME" | "CURRENT_TIMESTAMP")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_type_names() {
        assert_eq!("varchar".parse::<PgType>().unwrap(), PgType::Varchar);
        assert_eq!("double   precision".parse::<PgType>().unwrap(), PgType::DoublePrecision);
        assert_eq!("text[]".parse::<PgType>().unwrap(), PgType::TextArray);
        assert_eq!("jsonb".parse::<PgType>().unwrap(), PgType::Jsonb);
        assert_eq!("citext".parse::<PgType>().unwrap(), PgType::Other("CITEXT".to_string()));
        assert!("  ".parse::<PgType>().is_err());
    }

    #[test]
    fn test_column_sql_modifiers() {
        assert_eq!(ColumnType::of(PgType::Varchar).sql(), "VARCHAR(255)");
        assert_eq!(ColumnType::with_length(PgType::Varchar, 50).sql(), "VARCHAR(50)");
        let numeric = ColumnType {
            pg_type: PgType::Numeric,
            length: None,
            precision: Some(10),
            scale: Some(2),
        };
        assert_eq!(numeric.sql(), "NUMERIC(10, 2)");
        assert_eq!(numeric.cast_name(), "numeric");
        assert_eq!(ColumnType::of(PgType::TextArray).cast_name(), "text[]");
    }

    #[test]
    fn test_default_literals_by_category() {
        let int = ColumnType::of(PgType::Integer);
        assert_eq!(int.default_literal(&json!(5)), "5");
        assert_eq!(int.default_literal(&json!("7")), "7");

        let boolean = ColumnType::of(PgType::Boolean);
        assert_eq!(boolean.default_literal(&json!(false)), "false");

        let jsonb = ColumnType::of(PgType::Jsonb);
        assert_eq!(jsonb.default_literal(&json!({"a": 1})), r#"'{"a":1}'::jsonb"#);
        assert_eq!(jsonb.default_literal(&json!("[]")), "'[]'::jsonb");

        let array = ColumnType::of(PgType::TextArray);
        assert_eq!(array.default_literal(&json!(["a", "b"])), "ARRAY['a', 'b']");
        assert_eq!(array.default_literal(&json!([])), "ARRAY[]::text[]");

        let uuid = ColumnType::of(PgType::Uuid);
        assert_eq!(uuid.default_literal(&json!("gen_random_uuid()")), "gen_random_uuid()");
        assert_eq!(
            uuid.default_literal(&json!("00000000-0000-0000-0000-000000000000")),
            "'00000000-0000-0000-0000-000000000000'"
        );

        let text = ColumnType::of(PgType::Text);
        assert_eq!(text.default_literal(&json!("it's")), "'it''s'");
        assert_eq!(text.default_literal(&json!("now()")), "'now()'");

        let ts = ColumnType::of(PgType::Timestamptz);
        assert_eq!(ts.default_literal(&json!("CURRENT_TIMESTAMP")), "CURRENT_TIMESTAMP");
        assert_eq!(ts.default_literal(&json!("drop table x; --()")), "'drop table x; --()'");
    }
}
