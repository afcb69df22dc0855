use std::fmt;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::SqlRecordError;
use crate::results::ResultSet;
use crate::types::RowValues;

use super::params::Params;
use super::query::build_result_set;

pub(crate) type SharedSqliteConnection = Arc<Mutex<rusqlite::Connection>>;

/// A single `SQLite` connection shared behind an async mutex.
///
/// rusqlite is synchronous, so every operation runs on the blocking pool while
/// holding the lock.
#[derive(Clone)]
pub struct SqliteConnection {
    conn: SharedSqliteConnection,
    path: String,
}

impl SqliteConnection {
    pub(crate) fn new(conn: rusqlite::Connection, path: String) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            path,
        }
    }

    /// Run `func` with exclusive access to the underlying rusqlite connection.
    pub(crate) async fn with_connection<F, R>(&self, func: F) -> Result<R, SqlRecordError>
    where
        F: FnOnce(&mut rusqlite::Connection) -> Result<R, SqlRecordError> + Send + 'static,
        R: Send + 'static,
    {
        run_blocking(Arc::clone(&self.conn), func).await
    }

    /// Execute a SELECT and materialize every row.
    ///
    /// # Errors
    /// Returns `SqlRecordError` if preparing or executing the query fails.
    pub async fn execute_select(
        &self,
        query: &str,
        params: &[RowValues],
    ) -> Result<ResultSet, SqlRecordError> {
        let sql_owned = query.to_owned();
        let params_owned = Params::convert(params);
        self.with_connection(move |guard| {
            let mut stmt = guard.prepare(&sql_owned)?;
            build_result_set(&mut stmt, params_owned.as_values())
        })
        .await
    }

    /// Execute a DML statement and return rows affected.
    ///
    /// # Errors
    /// Returns `SqlRecordError` if preparing or executing the statement fails.
    pub async fn execute_dml(
        &self,
        query: &str,
        params: &[RowValues],
    ) -> Result<usize, SqlRecordError> {
        let sql_owned = query.to_owned();
        let params_owned = Params::convert(params);
        self.with_connection(move |guard| {
            let mut stmt = guard.prepare(&sql_owned)?;
            let rows = stmt.execute(rusqlite::params_from_iter(params_owned.0.iter()))?;
            Ok(rows)
        })
        .await
    }

    /// Execute an INSERT and return the new row's id.
    ///
    /// # Errors
    /// Returns `SqlRecordError` if preparing or executing the statement fails.
    pub async fn execute_insert(
        &self,
        query: &str,
        params: &[RowValues],
    ) -> Result<i64, SqlRecordError> {
        let sql_owned = query.to_owned();
        let params_owned = Params::convert(params);
        self.with_connection(move |guard| {
            let mut stmt = guard.prepare(&sql_owned)?;
            stmt.execute(rusqlite::params_from_iter(params_owned.0.iter()))?;
            drop(stmt);
            Ok(guard.last_insert_rowid())
        })
        .await
    }

    /// Execute several parameterless statements, such as a schema script.
    ///
    /// # Errors
    /// Returns `SqlRecordError` on the first failing statement; earlier ones stay applied.
    pub async fn execute_batch(&self, query: &str) -> Result<(), SqlRecordError> {
        let sql_owned = query.to_owned();
        self.with_connection(move |guard| {
            guard.execute_batch(&sql_owned)?;
            Ok(())
        })
        .await
    }
}

impl fmt::Debug for SqliteConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteConnection")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

pub(crate) async fn run_blocking<F, R>(
    conn: SharedSqliteConnection,
    func: F,
) -> Result<R, SqlRecordError>
where
    F: FnOnce(&mut rusqlite::Connection) -> Result<R, SqlRecordError> + Send + 'static,
    R: Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut guard = conn.blocking_lock();
        func(&mut guard)
    })
    .await
    .map_err(|e| SqlRecordError::ExecutionError(format!("sqlite spawn_blocking join error: {e}")))?
}
