//! Resource models and their persistence services.

pub mod company;
pub mod job;

pub use company::*;
pub use job::*;

use crate::error::AppError;
use crate::sql::SqlValue;
use serde::{Deserialize, Deserializer};

/// Distinguishes an absent field (`None`) from an explicit null (`Some(None)`).
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

pub(crate) fn parse_int_param(key: &str, s: &str) -> Result<i64, AppError> {
    s.trim()
        .parse()
        .map_err(|_| AppError::Validation(format!("{} must be an integer", key)))
}

pub(crate) fn parse_bool_param(key: &str, s: &str) -> Result<bool, AppError> {
    match s.trim() {
        v if v.eq_ignore_ascii_case("true") => Ok(true),
        v if v.eq_ignore_ascii_case("false") => Ok(false),
        _ => Err(AppError::Validation(format!("{} must be true or false", key))),
    }
}

pub(crate) fn unknown_filter(key: &str) -> AppError {
    AppError::Validation(format!("unknown filter: {}", key))
}

pub(crate) fn log_query(sql: &str, params: &[SqlValue]) {
    tracing::debug!(sql = %sql, params = ?params, "query");
}
