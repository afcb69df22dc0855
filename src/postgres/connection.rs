use std::fmt;
use std::sync::Arc;

use tokio_postgres::Client;

use crate::error::SqlRecordError;
use crate::results::ResultSet;
use crate::types::RowValues;

use super::params::Params;
use super::query::{build_result_set_from_statement, postgres_extract_value};

/// A single Postgres client. The wire connection is driven by a spawned task.
#[derive(Clone)]
pub struct PostgresConnection {
    client: Arc<Client>,
}

impl PostgresConnection {
    pub(crate) fn new(client: Client) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    /// Execute a SELECT and materialize every row.
    ///
    /// # Errors
    /// Returns errors from preparation or query execution.
    pub async fn execute_select(
        &self,
        query: &str,
        params: &[RowValues],
    ) -> Result<ResultSet, SqlRecordError> {
        let stmt = self.client.prepare(query).await?;
        let converted = Params::convert(params);
        let rows = self.client.query(&stmt, converted.as_refs()).await?;
        build_result_set_from_statement(&stmt, &rows)
    }

    /// Execute a DML statement and return rows affected.
    ///
    /// # Errors
    /// Returns errors from preparation or execution.
    pub async fn execute_dml(
        &self,
        query: &str,
        params: &[RowValues],
    ) -> Result<usize, SqlRecordError> {
        let stmt = self.client.prepare(query).await?;
        let converted = Params::convert(params);
        let rows = self.client.execute(&stmt, converted.as_refs()).await?;
        usize::try_from(rows).map_err(|e| {
            SqlRecordError::ExecutionError(format!("postgres affected rows conversion error: {e}"))
        })
    }

    /// Execute an `INSERT ... RETURNING id` and return the id.
    ///
    /// # Errors
    /// Returns `ExecutionError` if the statement returns no row or a non-integer id.
    pub async fn execute_insert(
        &self,
        query: &str,
        params: &[RowValues],
    ) -> Result<i64, SqlRecordError> {
        let stmt = self.client.prepare(query).await?;
        let converted = Params::convert(params);
        let row = self
            .client
            .query_opt(&stmt, converted.as_refs())
            .await?
            .ok_or_else(|| SqlRecordError::ExecutionError("insert returned no id".into()))?;
        match postgres_extract_value(&row, 0)? {
            RowValues::Int(id) => Ok(id),
            other => Err(SqlRecordError::ExecutionError(format!(
                "insert returned a non-integer id: {other:?}"
            ))),
        }
    }

    /// Execute several parameterless statements, such as a schema script.
    ///
    /// # Errors
    /// Returns the error of the first failing statement.
    pub async fn execute_batch(&self, query: &str) -> Result<(), SqlRecordError> {
        self.client.batch_execute(query).await?;
        Ok(())
    }
}

impl fmt::Debug for PostgresConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresConnection")
            .field("closed", &self.client.is_closed())
            .finish()
    }
}
