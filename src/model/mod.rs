//! Active-record models.
//!
//! A model is a type implementing [`Model`]: it names its table and its
//! mass-assignment policy, and inherits static query entry points. Row data lives in
//! [`Record<M>`].
//!
//! ```rust,no_run
//! use sql_record::prelude::*;
//!
//! struct User;
//!
//! impl Model for User {
//!     const TABLE: &'static str = "users";
//!     const FILLABLE: &'static [&'static str] = &["name", "email", "age"];
//!     const HIDDEN: &'static [&'static str] = &["password"];
//! }
//!
//! # async fn demo(db: &Database) -> Result<(), SqlRecordError> {
//! let mut user = User::create(db, [("name", RowValues::from("ana")), ("age", 30.into())]).await?;
//! user.set("age", 31);
//! user.save(db).await?;
//! let adults = User::filter(db, "age", ">", 18).count().await?;
//! # let _ = adults;
//! # Ok(())
//! # }
//! ```

mod policy;
mod record;

pub use policy::is_fillable;
pub use record::{Record, RecordState};

use async_trait::async_trait;

use crate::connection::Database;
use crate::error::SqlRecordError;
use crate::query::{Direction, QueryBuilder};
use crate::types::RowValues;

#[async_trait]
pub trait Model: Sized + Send + Sync + 'static {
    /// Table backing the model.
    const TABLE: &'static str;
    /// Keys always accepted by attribute writes.
    const FILLABLE: &'static [&'static str] = &[];
    /// Keys rejected by attribute writes; `*` rejects every key not in `FILLABLE`.
    const GUARDED: &'static [&'static str] = &["*"];
    /// Keys left out of `to_array`/`to_json`.
    const HIDDEN: &'static [&'static str] = &[];

    /// A builder over the model's table producing records.
    fn query(db: &Database) -> QueryBuilder<'_, Record<Self>> {
        db.table(Self::TABLE).map_to()
    }

    #[doc(alias = "where")]
    fn filter<'db>(
        db: &'db Database,
        column: &str,
        operator: &str,
        value: impl Into<RowValues>,
    ) -> QueryBuilder<'db, Record<Self>> {
        Self::query(db).filter(column, operator, value)
    }

    fn having<'db>(
        db: &'db Database,
        column: &str,
        operator: &str,
        value: impl Into<RowValues>,
    ) -> QueryBuilder<'db, Record<Self>> {
        Self::query(db).having(column, operator, value)
    }

    fn order_by<'db>(
        db: &'db Database,
        column: &str,
        direction: Direction,
    ) -> QueryBuilder<'db, Record<Self>> {
        Self::query(db).order_by(column, direction)
    }

    fn limit(db: &Database, limit: u64) -> QueryBuilder<'_, Record<Self>> {
        Self::query(db).limit(limit)
    }

    fn select<I, S>(db: &Database, fields: I) -> QueryBuilder<'_, Record<Self>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::query(db).select(fields)
    }

    /// Build a record from the fillable subset of `attributes` and insert it.
    ///
    /// # Errors
    /// Propagates backend errors.
    async fn create<I, K, V>(db: &Database, attributes: I) -> Result<Record<Self>, SqlRecordError>
    where
        I: IntoIterator<Item = (K, V)> + Send,
        K: Into<String> + Send,
        V: Into<RowValues> + Send,
    {
        let mut record = Record::new(attributes);
        record.save(db).await?;
        Ok(record)
    }

    /// The record with `id`, or `None`.
    ///
    /// # Errors
    /// Propagates backend errors.
    async fn find(db: &Database, id: i64) -> Result<Option<Record<Self>>, SqlRecordError> {
        Self::query(db).filter("id", "=", id).first().await
    }

    /// The record with `id`.
    ///
    /// # Errors
    /// Returns `NotFound` when no row has that id.
    async fn find_or_fail(db: &Database, id: i64) -> Result<Record<Self>, SqlRecordError> {
        Self::find(db, id)
            .await?
            .ok_or_else(|| SqlRecordError::NotFound(format!("Model not found with ID {id}")))
    }

    /// Every row of the table.
    ///
    /// # Errors
    /// Propagates backend errors.
    async fn all(db: &Database) -> Result<Vec<Record<Self>>, SqlRecordError> {
        Self::query(db).get().await
    }

    /// One column across the table.
    ///
    /// # Errors
    /// Propagates backend errors.
    async fn pluck(db: &Database, column: &str) -> Result<Vec<RowValues>, SqlRecordError> {
        Self::query(db).pluck(column).await
    }
}
