//! Fluent statement building.

mod builder;
mod compile;
mod condition;

pub use builder::{Direction, QueryBuilder};
pub use condition::Condition;

use crate::error::SqlRecordError;
use crate::results::CustomDbRow;
use crate::translation::{bind_named_placeholders, bind_numbered_placeholders};
use crate::types::{DatabaseType, QueryAndParams, RowValues};

/// Conversion from a fetched row into the builder's row type.
pub trait FromRow: Sized {
    /// # Errors
    /// Returns `SqlRecordError` if the row cannot be mapped.
    fn from_row(row: CustomDbRow) -> Result<Self, SqlRecordError>;
}

impl FromRow for CustomDbRow {
    fn from_row(row: CustomDbRow) -> Result<Self, SqlRecordError> {
        Ok(row)
    }
}

/// Parameters for caller-written SQL.
///
/// Positional placeholders must be numbered (`?1`, `$1`); either spelling is
/// rewritten for the connected backend, and `MySQL` gets the values reordered to
/// match its unnumbered `?`.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RawParams {
    #[default]
    None,
    /// Values for `:name` placeholders.
    Named(Vec<(String, RowValues)>),
    /// Values for `?N`/`$N` placeholders, in order.
    Positional(Vec<RowValues>),
}

impl RawParams {
    pub fn named(
        params: impl IntoIterator<Item = (impl Into<String>, impl Into<RowValues>)>,
    ) -> Self {
        RawParams::Named(
            params
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn positional(params: impl IntoIterator<Item = impl Into<RowValues>>) -> Self {
        RawParams::Positional(params.into_iter().map(Into::into).collect())
    }
}

pub(crate) fn bind_raw(
    sql: &str,
    params: RawParams,
    db_type: DatabaseType,
) -> Result<QueryAndParams, SqlRecordError> {
    match params {
        RawParams::None => Ok(QueryAndParams::new_without_params(sql)),
        RawParams::Named(named) => bind_named_placeholders(sql, &named, db_type.into()),
        RawParams::Positional(values) => {
            bind_numbered_placeholders(sql, &values, db_type.into())
        }
    }
}
