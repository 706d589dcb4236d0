//! Scalar parameter values.
//!
//! Every bind parameter produced by the clause and statement builders is a
//! [`Value`]. Keeping the set of scalars closed (rather than boxing
//! `dyn ToSql`) is what makes built statements comparable and printable:
//! builders can be tested by asserting on the exact parameter list.

use bytes::BytesMut;
use chrono::{DateTime, Utc};
use std::error::Error;
use tokio_postgres::types::{IsNull, ToSql, Type};
use uuid::Uuid;

/// A scalar value bound to a `$n` placeholder.
///
/// Covers the column types the forum schema uses: booleans, integers,
/// floats, text, UTC timestamps, UUIDs and JSON documents. `Null` binds as
/// SQL `NULL` regardless of column type.
///
/// # Examples
///
/// ```ignore
/// use pgboard::Value;
///
/// let v: Value = "active".into();
/// assert_eq!(v, Value::Text("active".to_string()));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
    Uuid(Uuid),
    Json(serde_json::Value),
}

impl Value {
    /// Returns `true` for `Value::Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

// ─── Conversions ────────────────────────────────────────────────────────────

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Uuid(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::Json(v)
    }
}

/// `None` becomes `Value::Null`, so optional model fields bind directly.
impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(inner) => inner.into(),
            None => Value::Null,
        }
    }
}

// ─── ToSql ──────────────────────────────────────────────────────────────────

impl ToSql for Value {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(v) => v.to_sql(ty, out),
            // Widen to the column's integer width so `Int` binds against
            // int2/int4 columns as well as int8.
            Value::Int(v) => match *ty {
                Type::INT2 => i16::try_from(*v)
                    .map_err(|_| format!("integer {v} out of range for int2"))?
                    .to_sql(ty, out),
                Type::INT4 => i32::try_from(*v)
                    .map_err(|_| format!("integer {v} out of range for int4"))?
                    .to_sql(ty, out),
                _ => v.to_sql(ty, out),
            },
            Value::Float(v) => match *ty {
                Type::FLOAT4 => (*v as f32).to_sql(ty, out),
                _ => v.to_sql(ty, out),
            },
            Value::Text(v) => v.as_str().to_sql(ty, out),
            Value::Timestamp(v) => match *ty {
                Type::TIMESTAMP => v.naive_utc().to_sql(ty, out),
                _ => v.to_sql(ty, out),
            },
            Value::Uuid(v) => v.to_sql(ty, out),
            Value::Json(v) => v.to_sql(ty, out),
        }
    }

    fn accepts(ty: &Type) -> bool {
        matches!(
            *ty,
            Type::BOOL
                | Type::INT2
                | Type::INT4
                | Type::INT8
                | Type::FLOAT4
                | Type::FLOAT8
                | Type::TEXT
                | Type::VARCHAR
                | Type::BPCHAR
                | Type::TIMESTAMP
                | Type::TIMESTAMPTZ
                | Type::UUID
                | Type::JSON
                | Type::JSONB
        )
    }

    tokio_postgres::types::to_sql_checked!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions_pick_the_right_variant() {
        assert_eq!(Value::from(true), Value::Bool(true));
        assert_eq!(Value::from(42_i32), Value::Int(42));
        assert_eq!(Value::from(42_i64), Value::Int(42));
        assert_eq!(Value::from(1.5), Value::Float(1.5));
        assert_eq!(Value::from("hi"), Value::Text("hi".to_string()));
        assert_eq!(
            Value::from(String::from("hi")),
            Value::Text("hi".to_string())
        );
    }

    #[test]
    fn option_maps_none_to_null() {
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some(7_i64)), Value::Int(7));
        assert!(Value::Null.is_null());
        assert!(!Value::Int(0).is_null());
    }

    #[test]
    fn int_encodes_at_column_width() {
        let mut buf = BytesMut::new();
        Value::Int(7).to_sql(&Type::INT4, &mut buf).unwrap();
        assert_eq!(buf.len(), 4);

        let mut buf = BytesMut::new();
        Value::Int(7).to_sql(&Type::INT8, &mut buf).unwrap();
        assert_eq!(buf.len(), 8);
    }

    #[test]
    fn int_out_of_range_for_narrow_column_errors() {
        let mut buf = BytesMut::new();
        let res = Value::Int(i64::from(i32::MAX) + 1).to_sql(&Type::INT4, &mut buf);
        assert!(res.is_err());
    }

    #[test]
    fn null_binds_anywhere_accepted() {
        let mut buf = BytesMut::new();
        let res = Value::Null.to_sql(&Type::TEXT, &mut buf).unwrap();
        assert!(matches!(res, IsNull::Yes));
        assert!(buf.is_empty());
    }

    #[test]
    fn accepts_covers_forum_column_types() {
        assert!(<Value as ToSql>::accepts(&Type::TEXT));
        assert!(<Value as ToSql>::accepts(&Type::INT8));
        assert!(<Value as ToSql>::accepts(&Type::TIMESTAMPTZ));
        assert!(<Value as ToSql>::accepts(&Type::JSONB));
        assert!(!<Value as ToSql>::accepts(&Type::BYTEA));
    }
}
