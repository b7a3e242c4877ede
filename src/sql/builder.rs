//! Builds parameterized SET and WHERE fragments. Identifiers come from code only, values only
//! travel as parameters.

use crate::error::AppError;
use crate::sql::SqlValue;
use std::cmp::Ordering;

/// Quote identifier for PostgreSQL.
pub(crate) fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Ordered field updates keyed by logical (API) name.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UpdatePayload {
    fields: Vec<(String, SqlValue)>,
}

impl UpdatePayload {
    pub fn new() -> Self {
        UpdatePayload { fields: Vec::new() }
    }

    /// Set a field. Setting an existing field replaces its value and keeps its position.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<SqlValue>) {
        let field = field.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(f, _)| *f == field) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((field, value)),
        }
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.set(field, value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.fields.iter().map(|(f, v)| (f.as_str(), v))
    }
}

/// Logical field name -> physical column name. Fields not listed keep their logical name.
#[derive(Clone, Copy, Debug)]
pub struct FieldNameMap<'a> {
    pairs: &'a [(&'a str, &'a str)],
}

impl<'a> FieldNameMap<'a> {
    pub const fn new(pairs: &'a [(&'a str, &'a str)]) -> Self {
        FieldNameMap { pairs }
    }

    pub const fn empty() -> Self {
        FieldNameMap { pairs: &[] }
    }

    pub fn physical<'b>(&self, logical: &'b str) -> &'b str
    where
        'a: 'b,
    {
        self.pairs
            .iter()
            .find(|(l, _)| *l == logical)
            .map(|(_, p)| *p)
            .unwrap_or(logical)
    }
}

/// `"col"=$1, "other"=$2` plus the values for those placeholders.
#[derive(Clone, Debug, PartialEq)]
pub struct SetFragment {
    pub column_assignments: String,
    pub values: Vec<SqlValue>,
}

/// SET fragment for a partial update. An empty payload is an error, never a no-op.
pub fn build_set_fragment(
    payload: &UpdatePayload,
    names: &FieldNameMap<'_>,
) -> Result<SetFragment, AppError> {
    if payload.is_empty() {
        return Err(AppError::NoUpdateData);
    }
    let mut sets = Vec::with_capacity(payload.len());
    let mut values = Vec::with_capacity(payload.len());
    for (i, (field, value)) in payload.iter().enumerate() {
        sets.push(format!("{}=${}", quoted(names.physical(field)), i + 1));
        values.push(value.clone());
    }
    Ok(SetFragment {
        column_assignments: sets.join(", "),
        values,
    })
}

/// One filter condition, resource-neutral. Columns are static so they never come from input.
#[derive(Clone, Debug, PartialEq)]
pub enum Criterion {
    /// `column>=$k`
    AtLeast { column: &'static str, value: SqlValue },
    /// `column<=$k`
    AtMost { column: &'static str, value: SqlValue },
    /// `column ILIKE $k` with the text wrapped in `%`.
    Contains { column: &'static str, text: String },
    /// Fixed predicate with no parameter, emitted only when enabled.
    Flag { predicate: &'static str, enabled: bool },
}

/// A per-resource filter shape that knows how its fields map to criteria, in declared order.
pub trait FilterCriteria {
    fn criteria(&self) -> Vec<Criterion>;
}

/// `WHERE a AND b` plus values, or an empty clause when nothing applies.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WhereFragment {
    pub where_clause: String,
    pub values: Vec<SqlValue>,
}

fn check_ranges(criteria: &[Criterion]) -> Result<(), AppError> {
    for lower in criteria {
        let Criterion::AtLeast { column, value: lo } = lower else { continue };
        for upper in criteria {
            if let Criterion::AtMost { column: c, value: hi } = upper {
                if c == column && lo.numeric_cmp(hi) == Some(Ordering::Greater) {
                    return Err(AppError::RangeInverted((*column).to_string()));
                }
            }
        }
    }
    Ok(())
}

/// WHERE fragment for an optional filter. Inverted ranges fail before any SQL is built.
pub fn build_where_fragment<F>(filter: Option<&F>) -> Result<WhereFragment, AppError>
where
    F: FilterCriteria + ?Sized,
{
    let criteria = filter.map(|f| f.criteria()).unwrap_or_default();
    check_ranges(&criteria)?;

    let mut values: Vec<SqlValue> = Vec::new();
    let mut where_parts = Vec::new();
    for criterion in criteria {
        match criterion {
            Criterion::AtLeast { column, value } if !value.is_null() => {
                values.push(value);
                where_parts.push(format!("{}>=${}", column, values.len()));
            }
            Criterion::AtMost { column, value } if !value.is_null() => {
                values.push(value);
                where_parts.push(format!("{}<=${}", column, values.len()));
            }
            Criterion::Contains { column, text } => {
                values.push(SqlValue::from(format!("%{}%", text)));
                where_parts.push(format!("{} ILIKE ${}", column, values.len()));
            }
            Criterion::Flag { predicate, enabled: true } => {
                where_parts.push(predicate.to_string());
            }
            _ => {}
        }
    }

    if where_parts.is_empty() {
        return Ok(WhereFragment::default());
    }
    Ok(WhereFragment {
        where_clause: format!("WHERE {}", where_parts.join(" AND ")),
        values,
    })
}
