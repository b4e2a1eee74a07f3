//! Decoding result rows into JSON objects.

use crate::executor::FormError;
use crate::json_helpers::number_value;
use base64::Engine as _;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};
use may_postgres::types::FromSql;
use may_postgres::Row;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::{Map, Value};

/// Decode every column of `row`, keyed by column name.
pub fn row_to_json(row: &Row) -> Result<Map<String, Value>, FormError> {
    let mut object = Map::with_capacity(row.columns().len());
    for (idx, column) in row.columns().iter().enumerate() {
        let value = column_value(row, idx, column.type_().name())?;
        object.insert(column.name().to_string(), value);
    }
    Ok(object)
}

fn get<'a, T: FromSql<'a>>(row: &'a Row, idx: usize) -> Result<Option<T>, FormError> {
    row.try_get::<usize, Option<T>>(idx).map_err(|e| {
        let name = row.columns().get(idx).map_or("?", |c| c.name());
        FormError::ParseError(format!("Failed to decode column '{name}': {e}"))
    })
}

fn opt<T>(value: Option<T>, f: impl FnOnce(T) -> Value) -> Value {
    value.map_or(Value::Null, f)
}

fn column_value(row: &Row, idx: usize, type_name: &str) -> Result<Value, FormError> {
    let value = match type_name {
        "bool" => opt(get::<bool>(row, idx)?, Value::Bool),
        "int2" => opt(get::<i16>(row, idx)?, |v| Value::from(v)),
        "int4" => opt(get::<i32>(row, idx)?, |v| Value::from(v)),
        "int8" => opt(get::<i64>(row, idx)?, |v| Value::from(v)),
        "float4" => opt(get::<f32>(row, idx)?, |v| number_value(f64::from(v))),
        "float8" => opt(get::<f64>(row, idx)?, number_value),
        "numeric" => opt(get::<Decimal>(row, idx)?, |d| {
            d.to_f64().map_or_else(|| Value::String(d.to_string()), number_value)
        }),
        "uuid" => opt(get::<uuid::Uuid>(row, idx)?, |u| Value::String(u.to_string())),
        "json" | "jsonb" => get::<Value>(row, idx)?.unwrap_or(Value::Null),
        "timestamptz" => opt(get::<DateTime<Utc>>(row, idx)?, |t| {
            Value::String(t.to_rfc3339_opts(SecondsFormat::AutoSi, true))
        }),
        "timestamp" => opt(get::<NaiveDateTime>(row, idx)?, |t| {
            Value::String(t.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
        }),
        "date" => opt(get::<NaiveDate>(row, idx)?, |d| Value::String(d.format("%Y-%m-%d").to_string())),
        "time" => opt(get::<NaiveTime>(row, idx)?, |t| Value::String(t.format("%H:%M:%S").to_string())),
        "bytea" => opt(get::<Vec<u8>>(row, idx)?, |b| {
            Value::String(base64::engine::general_purpose::STANDARD.encode(b))
        }),
        "_text" | "_varchar" | "_bpchar" => opt(get::<Vec<Option<String>>>(row, idx)?, |items| {
            Value::Array(items.into_iter().map(|s| opt(s, Value::String)).collect())
        }),
        "_int2" => opt(get::<Vec<Option<i16>>>(row, idx)?, |items| {
            Value::Array(items.into_iter().map(|n| opt(n, Value::from)).collect())
        }),
        "_int4" => opt(get::<Vec<Option<i32>>>(row, idx)?, |items| {
            Value::Array(items.into_iter().map(|n| opt(n, Value::from)).collect())
        }),
        "_int8" => opt(get::<Vec<Option<i64>>>(row, idx)?, |items| {
            Value::Array(items.into_iter().map(|n| opt(n, Value::from)).collect())
        }),
        // text, varchar, bpchar, name and anything else with a text form
        _ => opt(get::<String>(row, idx)?, Value::String),
    };
    Ok(value)
}
