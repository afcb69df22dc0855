use std::fmt;
use std::sync::Arc;

use mysql_async::prelude::Queryable;
use mysql_async::{Column, Conn, Row};
use tokio::sync::Mutex;

use crate::error::SqlRecordError;
use crate::results::ResultSet;
use crate::types::RowValues;

use super::params::Params;
use super::query::build_result_set;

/// A single `MySQL` connection. `mysql_async` needs `&mut Conn`, so it sits behind
/// an async mutex.
#[derive(Clone)]
pub struct MysqlConnection {
    conn: Arc<Mutex<Conn>>,
}

impl MysqlConnection {
    pub(crate) fn new(conn: Conn) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
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
        let mut conn = self.conn.lock().await;
        let result = conn.exec_iter(query, Params::convert(params)).await?;
        let columns: Vec<Column> = result.columns_ref().to_vec();
        let rows: Vec<Row> = result.collect_and_drop().await?;
        build_result_set(&columns, rows)
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
        let mut conn = self.conn.lock().await;
        conn.exec_drop(query, Params::convert(params)).await?;
        usize::try_from(conn.affected_rows()).map_err(|e| {
            SqlRecordError::ExecutionError(format!("mysql affected rows conversion error: {e}"))
        })
    }

    /// Execute an INSERT and return `LAST_INSERT_ID()`.
    ///
    /// # Errors
    /// Returns `ExecutionError` if the table has no auto-increment id.
    pub async fn execute_insert(
        &self,
        query: &str,
        params: &[RowValues],
    ) -> Result<i64, SqlRecordError> {
        let mut conn = self.conn.lock().await;
        conn.exec_drop(query, Params::convert(params)).await?;
        let id = conn
            .last_insert_id()
            .ok_or_else(|| SqlRecordError::ExecutionError("insert returned no id".into()))?;
        i64::try_from(id).map_err(|e| {
            SqlRecordError::ExecutionError(format!("mysql insert id conversion error: {e}"))
        })
    }

    /// Execute several parameterless statements, such as a schema script.
    ///
    /// # Errors
    /// Returns the error of the first failing statement.
    pub async fn execute_batch(&self, query: &str) -> Result<(), SqlRecordError> {
        let mut conn = self.conn.lock().await;
        conn.query_drop(query).await?;
        Ok(())
    }
}

impl fmt::Debug for MysqlConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MysqlConnection").finish_non_exhaustive()
    }
}
