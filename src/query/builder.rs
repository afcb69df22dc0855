use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

use super::condition::Condition;
use super::{FromRow, RawParams, bind_raw};
use crate::connection::Database;
use crate::error::SqlRecordError;
use crate::results::{CustomDbRow, ResultSet};
use crate::types::RowValues;

/// Sort direction for [`QueryBuilder::order_by`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    #[must_use]
    pub fn as_sql(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for Direction {
    type Err = SqlRecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("asc") {
            Ok(Direction::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Ok(Direction::Desc)
        } else {
            Err(SqlRecordError::UsageError(format!(
                "invalid sort direction '{s}' (expected ASC or DESC)"
            )))
        }
    }
}

#[derive(Debug, Clone)]
pub(super) struct Join {
    pub(super) table: String,
    pub(super) left: String,
    pub(super) operator: String,
    pub(super) right: String,
}

/// Fluent builder for one statement against one table.
///
/// Clauses are kept apart and always rendered in SQL order, so calls may come in any
/// order. Every value travels as a bind parameter. Table, column and operator
/// strings, on the other hand, are written into the SQL as given and must never come
/// from untrusted input.
///
/// `T` is the row type produced by [`get`](Self::get) and [`first`](Self::first):
/// [`CustomDbRow`] for plain table access, a model's `Record` for model queries.
pub struct QueryBuilder<'db, T = CustomDbRow> {
    pub(super) db: &'db Database,
    pub(super) table: String,
    pub(super) fields: Vec<String>,
    pub(super) joins: Vec<Join>,
    pub(super) wheres: Vec<Condition>,
    pub(super) group_by: Option<String>,
    pub(super) havings: Vec<Condition>,
    pub(super) orders: Vec<(String, Direction)>,
    pub(super) limit: Option<u64>,
    pub(super) offset: Option<u64>,
    row: PhantomData<fn() -> T>,
}

impl<T> fmt::Debug for QueryBuilder<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryBuilder")
            .field("table", &self.table)
            .field("fields", &self.fields)
            .field("joins", &self.joins)
            .field("wheres", &self.wheres)
            .field("group_by", &self.group_by)
            .field("havings", &self.havings)
            .field("orders", &self.orders)
            .field("limit", &self.limit)
            .field("offset", &self.offset)
            .finish_non_exhaustive()
    }
}

impl<'db> QueryBuilder<'db, CustomDbRow> {
    pub(crate) fn new(db: &'db Database, table: impl Into<String>) -> Self {
        Self {
            db,
            table: table.into(),
            fields: Vec::new(),
            joins: Vec::new(),
            wheres: Vec::new(),
            group_by: None,
            havings: Vec::new(),
            orders: Vec::new(),
            limit: None,
            offset: None,
            row: PhantomData,
        }
    }
}

impl<'db, T> QueryBuilder<'db, T> {
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Produce rows of type `U` instead of `T`.
    #[must_use]
    pub fn map_to<U>(self) -> QueryBuilder<'db, U> {
        QueryBuilder {
            db: self.db,
            table: self.table,
            fields: self.fields,
            joins: self.joins,
            wheres: self.wheres,
            group_by: self.group_by,
            havings: self.havings,
            orders: self.orders,
            limit: self.limit,
            offset: self.offset,
            row: PhantomData,
        }
    }

    /// Projected columns for `get`/`first`. An empty list means `*`.
    #[must_use]
    pub fn select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Add a `WHERE` condition; repeated calls are AND-ed.
    #[doc(alias = "where")]
    #[must_use]
    pub fn filter(
        mut self,
        column: impl Into<String>,
        operator: impl Into<String>,
        value: impl Into<RowValues>,
    ) -> Self {
        self.wheres.push(Condition::new(column, operator, value));
        self
    }

    /// Add a `HAVING` condition; repeated calls are AND-ed.
    #[must_use]
    pub fn having(
        mut self,
        column: impl Into<String>,
        operator: impl Into<String>,
        value: impl Into<RowValues>,
    ) -> Self {
        self.havings.push(Condition::new(column, operator, value));
        self
    }

    #[must_use]
    pub fn order_by(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.orders.push((column.into(), direction));
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// `JOIN <table> ON <left> <operator> <right>`
    #[must_use]
    pub fn join(
        mut self,
        table: impl Into<String>,
        left: impl Into<String>,
        operator: impl Into<String>,
        right: impl Into<String>,
    ) -> Self {
        self.joins.push(Join {
            table: table.into(),
            left: left.into(),
            operator: operator.into(),
            right: right.into(),
        });
        self
    }

    /// `GROUP BY <columns>`; `columns` is a comma-separated list.
    #[must_use]
    pub fn group_by(mut self, columns: impl Into<String>) -> Self {
        self.group_by = Some(columns.into());
        self
    }

    /// Insert one row and return the identity the backend assigned.
    ///
    /// Columns follow the iteration order of `data`; a repeated key keeps its first
    /// position and its last value. Empty `data` inserts a row of defaults.
    ///
    /// # Errors
    /// Propagates backend errors (constraint violations, unknown columns).
    pub async fn insert(
        self,
        data: impl IntoIterator<Item = (impl Into<String>, impl Into<RowValues>)>,
    ) -> Result<i64, SqlRecordError> {
        let data = collect_columns(data);
        let conn = self.db.connection().await?;
        let stmt = self.compile_insert(&data, conn.db_type())?;
        conn.execute_insert(&stmt).await
    }

    /// `UPDATE` the rows matching `conditions` (column equality) and any `filter`s.
    ///
    /// # Errors
    /// Returns `UsageError` if `data` is empty, otherwise backend errors.
    pub async fn update(
        self,
        data: impl IntoIterator<Item = (impl Into<String>, impl Into<RowValues>)>,
        conditions: impl IntoIterator<Item = (impl Into<String>, impl Into<RowValues>)>,
    ) -> Result<usize, SqlRecordError> {
        let data = collect_columns(data);
        let keys = collect_columns(conditions);
        if data.is_empty() {
            return Err(SqlRecordError::UsageError(format!(
                "No data provided for update on {}",
                self.table
            )));
        }
        let conn = self.db.connection().await?;
        let stmt = self.compile_update(&data, &keys, conn.db_type())?;
        conn.execute_dml(&stmt).await
    }

    /// Delete the rows matching the builder's `filter`s.
    ///
    /// # Errors
    /// Returns `UsageError` (and sends nothing) when there is no `filter`.
    pub async fn delete(self) -> Result<usize, SqlRecordError> {
        if self.wheres.is_empty() {
            return Err(SqlRecordError::UsageError(
                "No conditions provided for delete operation.".into(),
            ));
        }
        let conn = self.db.connection().await?;
        let stmt = self.compile_delete(conn.db_type())?;
        conn.execute_dml(&stmt).await
    }

    /// `COUNT(*)` over the joined and filtered table.
    ///
    /// # Errors
    /// Propagates backend errors.
    pub async fn count(self) -> Result<i64, SqlRecordError> {
        let conn = self.db.connection().await?;
        let stmt = self.compile_count(conn.db_type())?;
        let rs = conn.execute_select(&stmt).await?;
        rs.results
            .first()
            .and_then(|row| row.get_by_index(0))
            .and_then(RowValues::as_int)
            .copied()
            .ok_or_else(|| SqlRecordError::ExecutionError("COUNT returned no integer".into()))
    }

    /// Values of one column, in result order.
    ///
    /// # Errors
    /// Propagates backend errors.
    pub async fn pluck(self, column: &str) -> Result<Vec<RowValues>, SqlRecordError> {
        let conn = self.db.connection().await?;
        let stmt = self.compile_pluck(column, conn.db_type())?;
        let rs = conn.execute_select(&stmt).await?;
        Ok(rs
            .into_iter()
            .map(|row| row.rows.into_iter().next().unwrap_or(RowValues::Null))
            .collect())
    }

    /// Run caller-written SQL; the builder's clauses are ignored.
    ///
    /// # Errors
    /// Returns `ParameterError` for unbound names, otherwise backend errors.
    pub async fn raw(self, sql: &str, params: RawParams) -> Result<ResultSet, SqlRecordError> {
        let conn = self.db.connection().await?;
        let stmt = bind_raw(sql, params, conn.db_type())?;
        conn.execute_select(&stmt).await
    }
}

impl<T: FromRow> QueryBuilder<'_, T> {
    /// Every matching row.
    ///
    /// # Errors
    /// Propagates backend and row-mapping errors.
    pub async fn get(self) -> Result<Vec<T>, SqlRecordError> {
        let conn = self.db.connection().await?;
        let stmt = self.to_select_sql(conn.db_type())?;
        let rs = conn.execute_select(&stmt).await?;
        rs.into_iter().map(T::from_row).collect()
    }

    /// The first matching row, or `None`.
    ///
    /// # Errors
    /// Propagates backend and row-mapping errors.
    pub async fn first(mut self) -> Result<Option<T>, SqlRecordError> {
        self.limit = Some(1);
        Ok(self.get().await?.into_iter().next())
    }
}

/// Collect `(column, value)` pairs, folding repeated columns.
pub(super) fn collect_columns(
    data: impl IntoIterator<Item = (impl Into<String>, impl Into<RowValues>)>,
) -> Vec<(String, RowValues)> {
    let mut out: Vec<(String, RowValues)> = Vec::new();
    for (column, value) in data {
        let column = column.into();
        let value = value.into();
        match out.iter_mut().find(|(existing, _)| *existing == column) {
            Some(slot) => slot.1 = value,
            None => out.push((column, value)),
        }
    }
    out
}
