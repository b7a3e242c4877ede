//! Typed, nullable values that sqlx can bind as positional parameters.

use serde::Serialize;
use sqlx::encode::{Encode, IsNull};
use sqlx::postgres::{PgTypeInfo, Postgres};
use sqlx::{Database, Type};
use std::cmp::Ordering;

/// A value bound to a `$n` placeholder. Nulls keep their type so they bind against the
/// matching column type.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    Text(Option<String>),
    Int(Option<i64>),
    Float(Option<f64>),
    Bool(Option<bool>),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        match self {
            SqlValue::Text(v) => v.is_none(),
            SqlValue::Int(v) => v.is_none(),
            SqlValue::Float(v) => v.is_none(),
            SqlValue::Bool(v) => v.is_none(),
        }
    }

    /// Numeric view used for range comparisons. Text and bool have none.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SqlValue::Int(Some(n)) => Some(*n as f64),
            SqlValue::Float(Some(n)) => Some(*n),
            _ => None,
        }
    }

    /// Order two numeric values. Integer pairs compare exactly; mixed pairs go through f64.
    pub fn numeric_cmp(&self, other: &SqlValue) -> Option<Ordering> {
        match (self, other) {
            (SqlValue::Int(Some(a)), SqlValue::Int(Some(b))) => Some(a.cmp(b)),
            _ => self.as_f64()?.partial_cmp(&other.as_f64()?),
        }
    }
}

impl From<String> for SqlValue {
    fn from(s: String) -> Self {
        SqlValue::Text(Some(s))
    }
}

impl From<&str> for SqlValue {
    fn from(s: &str) -> Self {
        SqlValue::Text(Some(s.to_string()))
    }
}

impl From<Option<String>> for SqlValue {
    fn from(s: Option<String>) -> Self {
        SqlValue::Text(s)
    }
}

impl From<i32> for SqlValue {
    fn from(n: i32) -> Self {
        SqlValue::Int(Some(n.into()))
    }
}

impl From<i64> for SqlValue {
    fn from(n: i64) -> Self {
        SqlValue::Int(Some(n))
    }
}

impl From<Option<i32>> for SqlValue {
    fn from(n: Option<i32>) -> Self {
        SqlValue::Int(n.map(i64::from))
    }
}

impl From<f64> for SqlValue {
    fn from(n: f64) -> Self {
        SqlValue::Float(Some(n))
    }
}

impl From<Option<f64>> for SqlValue {
    fn from(n: Option<f64>) -> Self {
        SqlValue::Float(n)
    }
}

impl From<bool> for SqlValue {
    fn from(b: bool) -> Self {
        SqlValue::Bool(Some(b))
    }
}

impl<'q> Encode<'q, Postgres> for SqlValue {
    fn encode_by_ref(
        &self,
        buf: &mut <Postgres as Database>::ArgumentBuffer<'q>,
    ) -> Result<IsNull, Box<dyn std::error::Error + Send + Sync>> {
        match self {
            SqlValue::Text(v) => <Option<String> as Encode<Postgres>>::encode_by_ref(v, buf),
            SqlValue::Int(v) => <Option<i64> as Encode<Postgres>>::encode_by_ref(v, buf),
            SqlValue::Float(v) => <Option<f64> as Encode<Postgres>>::encode_by_ref(v, buf),
            SqlValue::Bool(v) => <Option<bool> as Encode<Postgres>>::encode_by_ref(v, buf),
        }
    }

    fn produces(&self) -> Option<PgTypeInfo> {
        Some(match self {
            SqlValue::Text(_) => <String as Type<Postgres>>::type_info(),
            SqlValue::Int(_) => <i64 as Type<Postgres>>::type_info(),
            SqlValue::Float(_) => <f64 as Type<Postgres>>::type_info(),
            SqlValue::Bool(_) => <bool as Type<Postgres>>::type_info(),
        })
    }
}

impl Type<Postgres> for SqlValue {
    fn type_info() -> PgTypeInfo {
        <String as Type<Postgres>>::type_info()
    }

    fn compatible(_ty: &PgTypeInfo) -> bool {
        true
    }
}
