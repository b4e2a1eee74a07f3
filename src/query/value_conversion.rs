//! Value conversion from SeaQuery to may_postgres.
//!
//! Statements built with sea-query carry their bound values as
//! `sea_query::Values`; these are converted into owned `ToSql` parameters
//! before execution. NULLs keep the Rust type of their variant so that the
//! driver's type check sees the same type as the non-null case.

use crate::executor::FormError;
use may_postgres::types::ToSql;
use sea_query::Value;

/// Convert SeaQuery values into owned `ToSql` parameters.
///
/// # Errors
///
/// Returns `FormError::Other` for value types the store never binds
/// (dates, decimals, arrays and so on are sent as text instead).
pub fn convert_values(values: &sea_query::Values) -> Result<Vec<Box<dyn ToSql>>, FormError> {
    values.iter().map(convert_value).collect()
}

fn convert_value(value: &Value) -> Result<Box<dyn ToSql>, FormError> {
    let param: Box<dyn ToSql> = match value {
        Value::Bool(b) => Box::new(*b),
        Value::TinyInt(i) => Box::new(i.map(i16::from)),
        Value::SmallInt(i) => Box::new(*i),
        Value::Int(i) => Box::new(*i),
        Value::BigInt(i) => Box::new(*i),
        Value::TinyUnsigned(u) => Box::new(u.map(i16::from)),
        Value::SmallUnsigned(u) => Box::new(u.map(i32::from)),
        Value::Unsigned(u) => Box::new(u.map(i64::from)),
        Value::BigUnsigned(u) => {
            let converted = match u {
                Some(u) => Some(i64::try_from(*u).map_err(|_| {
                    FormError::Other(format!("Value {u} exceeds the range of BIGINT"))
                })?),
                None => None,
            };
            Box::new(converted)
        }
        Value::Float(f) => Box::new(*f),
        Value::Double(d) => Box::new(*d),
        Value::String(s) => Box::new(s.clone()),
        Value::Bytes(b) => Box::new(b.clone()),
        Value::Json(j) => {
            let text = j
                .as_ref()
                .map(|j| serde_json::to_string(&**j))
                .transpose()
                .map_err(|e| FormError::Other(format!("Failed to serialize JSON: {e}")))?;
            Box::new(text)
        }
        _ => {
            return Err(FormError::Other(format!(
                "Unsupported value type in query: {value:?}"
            )))
        }
    };
    Ok(param)
}

/// Convert `values` and run `f` with borrowed parameters.
///
/// # Errors
///
/// Returns a conversion error, or whatever `f` returns.
pub fn with_converted_params<F, R>(values: &sea_query::Values, f: F) -> Result<R, FormError>
where
    F: FnOnce(&[&dyn ToSql]) -> Result<R, FormError>,
{
    let owned = convert_values(values)?;
    let params: Vec<&dyn ToSql> = owned.iter().map(|p| p.as_ref()).collect();
    f(&params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_query::Values;

    #[test]
    fn test_converts_store_values() {
        let values = Values(vec![
            Value::String(Some("hello".to_string())),
            Value::String(None),
            Value::Bytes(Some(vec![1, 2, 3])),
            Value::BigUnsigned(Some(10)),
            Value::Bool(Some(true)),
        ]);
        let count = with_converted_params(&values, |params| Ok(params.len())).unwrap();
        assert_eq!(count, 5);
    }

    #[test]
    fn test_big_unsigned_overflow() {
        let values = Values(vec![Value::BigUnsigned(Some(u64::MAX))]);
        let err = convert_values(&values).err().unwrap();
        assert!(err.to_string().contains("BIGINT"));
    }

    #[test]
    fn test_closure_error_is_returned() {
        let values = Values(Vec::new());
        let err = with_converted_params(&values, |_| -> Result<(), FormError> {
            Err(FormError::QueryError("boom".to_string()))
        })
        .unwrap_err();
        assert_eq!(err.to_string(), "Query error: boom");
    }
}
