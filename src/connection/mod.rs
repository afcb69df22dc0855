//! The open backend handle and the context that owns it.

mod database;

pub use database::Database;

use tracing::debug;

use crate::config::ConnectionSettings;
use crate::error::SqlRecordError;
use crate::results::ResultSet;
use crate::types::{DatabaseType, QueryAndParams};

#[cfg(feature = "mysql")]
use crate::mysql::{MysqlConnection, MysqlOptions};
#[cfg(feature = "postgres")]
use crate::postgres::{PostgresConnection, PostgresOptions};
#[cfg(feature = "sqlite")]
use crate::sqlite::{SqliteConnection, SqliteOptions};

/// One open connection to a backend.
///
/// Statements arrive already rendered in the backend's placeholder syntax, with
/// parameters in placeholder order (see [`QueryAndParams`]).
#[derive(Debug, Clone)]
pub enum Connection {
    #[cfg(feature = "sqlite")]
    Sqlite(SqliteConnection),
    #[cfg(feature = "postgres")]
    Postgres(PostgresConnection),
    #[cfg(feature = "mysql")]
    MySql(MysqlConnection),
}

impl Connection {
    /// Open a connection for `db_type` using `settings`.
    ///
    /// # Errors
    /// Returns `ConfigError` for missing settings and `ConnectionError` if the backend
    /// cannot be reached.
    pub async fn open(
        db_type: DatabaseType,
        settings: &ConnectionSettings,
    ) -> Result<Self, SqlRecordError> {
        match db_type {
            #[cfg(feature = "sqlite")]
            DatabaseType::Sqlite => Ok(Connection::Sqlite(
                SqliteOptions::from_settings(settings)?.connect().await?,
            )),
            #[cfg(feature = "postgres")]
            DatabaseType::Postgres => Ok(Connection::Postgres(
                PostgresOptions::from_settings(settings)?.connect().await?,
            )),
            #[cfg(feature = "mysql")]
            DatabaseType::MySql => Ok(Connection::MySql(
                MysqlOptions::from_settings(settings)?.connect().await?,
            )),
        }
    }

    /// Backend of this connection.
    #[must_use]
    pub fn db_type(&self) -> DatabaseType {
        match self {
            #[cfg(feature = "sqlite")]
            Connection::Sqlite(_) => DatabaseType::Sqlite,
            #[cfg(feature = "postgres")]
            Connection::Postgres(_) => DatabaseType::Postgres,
            #[cfg(feature = "mysql")]
            Connection::MySql(_) => DatabaseType::MySql,
        }
    }

    /// Run a row-returning statement.
    ///
    /// # Errors
    /// Propagates backend errors unchanged.
    pub async fn execute_select(&self, stmt: &QueryAndParams) -> Result<ResultSet, SqlRecordError> {
        debug!(sql = %stmt.query, binds = stmt.params.len(), "select");
        match self {
            #[cfg(feature = "sqlite")]
            Connection::Sqlite(conn) => conn.execute_select(&stmt.query, &stmt.params).await,
            #[cfg(feature = "postgres")]
            Connection::Postgres(conn) => conn.execute_select(&stmt.query, &stmt.params).await,
            #[cfg(feature = "mysql")]
            Connection::MySql(conn) => conn.execute_select(&stmt.query, &stmt.params).await,
        }
    }

    /// Run an UPDATE/DELETE and return the affected-row count.
    ///
    /// # Errors
    /// Propagates backend errors unchanged.
    pub async fn execute_dml(&self, stmt: &QueryAndParams) -> Result<usize, SqlRecordError> {
        debug!(sql = %stmt.query, binds = stmt.params.len(), "dml");
        match self {
            #[cfg(feature = "sqlite")]
            Connection::Sqlite(conn) => conn.execute_dml(&stmt.query, &stmt.params).await,
            #[cfg(feature = "postgres")]
            Connection::Postgres(conn) => conn.execute_dml(&stmt.query, &stmt.params).await,
            #[cfg(feature = "mysql")]
            Connection::MySql(conn) => conn.execute_dml(&stmt.query, &stmt.params).await,
        }
    }

    /// Run an INSERT and return the identity the backend assigned.
    ///
    /// Postgres statements must end in `RETURNING id`; SQLite and `MySQL` report the
    /// last inserted id of the connection.
    ///
    /// # Errors
    /// Propagates backend errors unchanged.
    pub async fn execute_insert(&self, stmt: &QueryAndParams) -> Result<i64, SqlRecordError> {
        debug!(sql = %stmt.query, binds = stmt.params.len(), "insert");
        match self {
            #[cfg(feature = "sqlite")]
            Connection::Sqlite(conn) => conn.execute_insert(&stmt.query, &stmt.params).await,
            #[cfg(feature = "postgres")]
            Connection::Postgres(conn) => conn.execute_insert(&stmt.query, &stmt.params).await,
            #[cfg(feature = "mysql")]
            Connection::MySql(conn) => conn.execute_insert(&stmt.query, &stmt.params).await,
        }
    }

    /// Run several parameterless statements, for schema setup. No transaction is opened.
    ///
    /// # Errors
    /// Propagates backend errors unchanged.
    pub async fn execute_batch(&self, sql: &str) -> Result<(), SqlRecordError> {
        debug!(sql = %sql, "batch");
        match self {
            #[cfg(feature = "sqlite")]
            Connection::Sqlite(conn) => conn.execute_batch(sql).await,
            #[cfg(feature = "postgres")]
            Connection::Postgres(conn) => conn.execute_batch(sql).await,
            #[cfg(feature = "mysql")]
            Connection::MySql(conn) => conn.execute_batch(sql).await,
        }
    }
}
