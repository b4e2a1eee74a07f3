//! Bridging sea-query statements and may_postgres rows.
//!
//! - **Value Conversion**: SeaQuery `Value` to owned `ToSql` parameters
//! - **Row**: result rows to JSON objects, decoded by column type
//! - **Bind**: text-parameter binding with a cast to the column type

pub mod row;
pub mod value_conversion;

pub use row::row_to_json;
pub use value_conversion::{convert_values, with_converted_params};

use crate::ddl::iden;
use crate::json_helpers::{pg_array_literal, value_as_text};
use crate::executor::{FormError, FormExecutor};
use crate::schema::{ColumnType, PgType, TypeCategory};
use may_postgres::Row;
use sea_query::{Expr, Func, QueryStatementWriter, PostgresQueryBuilder};
use serde_json::Value;

/// Bind `text` as a text parameter and cast it to `column`'s SQL type.
///
/// `BYTEA` values arrive as base64 and are bound as raw bytes instead.
pub fn bind_text(text: Option<String>, column: &ColumnType) -> Result<Expr, FormError> {
    if column.pg_type == PgType::Bytea {
        if let Some(encoded) = text {
            use base64::Engine as _;
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(encoded.as_bytes())
                .map_err(|e| FormError::ParseError(format!("Invalid base64 for BYTEA column: {e}")))?;
            return Ok(Expr::val(Some(bytes)));
        }
    }
    let as_text = Func::cast_as(Expr::val(text), iden("text"));
    Ok(Func::cast_as(as_text, iden(&column.cast_name())).into())
}

/// Bind a payload value for `column`. JSON arrays headed for an array column
/// are sent as a PostgreSQL array literal.
pub fn bind_value(value: &Value, column: &ColumnType) -> Result<Expr, FormError> {
    match value {
        Value::Array(items) if column.category() == TypeCategory::Array => {
            bind_text(Some(pg_array_literal(items)), column)
        }
        other => bind_text(value_as_text(other), column),
    }
}

/// Build a statement and execute it, returning the affected row count.
pub fn execute_statement<S, E>(executor: &E, statement: &S) -> Result<u64, FormError>
where
    S: QueryStatementWriter,
    E: FormExecutor + ?Sized,
{
    let (sql, values) = statement.build(PostgresQueryBuilder);
    with_converted_params(&values, |params| executor.execute(&sql, params))
}

/// Build a statement and return every row.
pub fn query_rows<S, E>(executor: &E, statement: &S) -> Result<Vec<Row>, FormError>
where
    S: QueryStatementWriter,
    E: FormExecutor + ?Sized,
{
    let (sql, values) = statement.build(PostgresQueryBuilder);
    with_converted_params(&values, |params| executor.query_all(&sql, params))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_query::{Query, Value};

    #[test]
    fn test_bind_text_casts_through_text() {
        let column = ColumnType::of(PgType::Numeric);
        let expr = bind_text(Some("12.5".to_string()), &column).unwrap();
        let (sql, values) = Query::select().expr(expr).build(PostgresQueryBuilder);
        assert_eq!(sql, "SELECT CAST(CAST($1 AS text) AS numeric)");
        assert_eq!(values.0, vec![Value::String(Some("12.5".to_string()))]);
    }

    #[test]
    fn test_bind_bytea_decodes_base64() {
        let column = ColumnType::of(PgType::Bytea);
        let expr = bind_text(Some("aGk=".to_string()), &column).unwrap();
        let (sql, values) = Query::select().expr(expr).build(PostgresQueryBuilder);
        assert_eq!(sql, "SELECT $1");
        assert_eq!(values.0, vec![Value::Bytes(Some(b"hi".to_vec()))]);

        assert!(bind_text(Some("%%%".to_string()), &column).is_err());
    }

    #[test]
    fn test_bind_null_keeps_cast() {
        let column = ColumnType::of(PgType::Bytea);
        let expr = bind_text(None, &column).unwrap();
        let (sql, values) = Query::select().expr(expr).build(PostgresQueryBuilder);
        assert_eq!(sql, "SELECT CAST(CAST($1 AS text) AS bytea)");
        assert_eq!(values.0, vec![Value::String(None)]);
    }

    #[test]
    fn test_bind_value_renders_array_literal() {
        let column = ColumnType::of(PgType::TextArray);
        let expr = bind_value(&serde_json::json!(["pump", "valve \"B\""]), &column).unwrap();
        let (sql, values) = Query::select().expr(expr).build(PostgresQueryBuilder);
        assert_eq!(sql, "SELECT CAST(CAST($1 AS text) AS text[])");
        assert_eq!(
            values.0,
            vec![Value::String(Some(r#"{"pump","valve \"B\""}"#.to_string()))]
        );

        let column = ColumnType::of(PgType::Jsonb);
        let expr = bind_value(&serde_json::json!([1, 2]), &column).unwrap();
        let (_, values) = Query::select().expr(expr).build(PostgresQueryBuilder);
        assert_eq!(values.0, vec![Value::String(Some("[1,2]".to_string()))]);
    }
}
