use std::path::Path;

use tokio::sync::OnceCell;
use tracing::info;

use super::Connection;
use crate::config::{ConfigLoader, DatabaseConfig};
#[cfg(feature = "sqlite")]
use crate::config::ConnectionSettings;
use crate::error::SqlRecordError;
use crate::query::{QueryBuilder, RawParams, bind_raw};
use crate::results::{CustomDbRow, ResultSet};
use crate::types::DatabaseType;

/// The connection provider: resolves the default backend from configuration and
/// holds at most one open [`Connection`].
///
/// The connection is opened on first use and reused until [`Database::close`] or
/// drop. Query builders and records borrow the context, so it cannot be closed
/// while one of them is alive.
///
/// ```rust,no_run
/// use sql_record::prelude::*;
///
/// # async fn demo() -> Result<(), SqlRecordError> {
/// let db = Database::from_config_file("database.json")?;
/// let adults = db.table("users").filter("age", ">", 18).count().await?;
/// # let _ = adults;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Database {
    config: DatabaseConfig,
    db_type: DatabaseType,
    connection: OnceCell<Connection>,
}

impl Database {
    /// Build a context from an in-memory configuration.
    ///
    /// # Errors
    /// Returns `DriverNotFound` if the default backend is missing or unsupported.
    pub fn from_config(config: DatabaseConfig) -> Result<Self, SqlRecordError> {
        let (db_type, _) = config.default_connection()?;
        Ok(Self {
            config,
            db_type,
            connection: OnceCell::new(),
        })
    }

    /// Build a context from a JSON configuration file.
    ///
    /// # Errors
    /// Returns `ConfigFileNotFound`, `ConfigError` or `DriverNotFound`.
    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self, SqlRecordError> {
        Self::from_config(ConfigLoader::load(path)?)
    }

    /// A context for a single SQLite database (`:memory:` or a file path).
    #[cfg(feature = "sqlite")]
    #[must_use]
    pub fn sqlite(path: impl Into<String>) -> Self {
        Self {
            config: DatabaseConfig::single("sqlite", ConnectionSettings::sqlite(path)),
            db_type: DatabaseType::Sqlite,
            connection: OnceCell::new(),
        }
    }

    /// The configured default backend.
    #[must_use]
    pub fn db_type(&self) -> DatabaseType {
        self.db_type
    }

    #[must_use]
    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Whether the connection has been opened.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connection.initialized()
    }

    /// The open connection, opening it on first call.
    ///
    /// # Errors
    /// Returns the bootstrap error if the connection cannot be opened; a later call
    /// tries again.
    pub async fn connection(&self) -> Result<&Connection, SqlRecordError> {
        self.connection
            .get_or_try_init(|| async {
                let (db_type, settings) = self.config.default_connection()?;
                Connection::open(db_type, settings).await
            })
            .await
    }

    /// A query builder over `table` returning raw rows.
    #[must_use]
    pub fn table(&self, table: impl Into<String>) -> QueryBuilder<'_, CustomDbRow> {
        QueryBuilder::new(self, table)
    }

    /// Run caller-written SQL with named or positional parameters.
    ///
    /// # Errors
    /// Returns `ParameterError` for unbound names, otherwise backend errors.
    pub async fn raw(&self, sql: &str, params: RawParams) -> Result<ResultSet, SqlRecordError> {
        let conn = self.connection().await?;
        let stmt = bind_raw(sql, params, conn.db_type())?;
        conn.execute_select(&stmt).await
    }

    /// Run several parameterless statements for schema setup or seeding.
    ///
    /// No transaction is opened: statements before a failing one stay applied.
    ///
    /// # Errors
    /// Propagates backend errors.
    pub async fn execute_batch(&self, sql: &str) -> Result<(), SqlRecordError> {
        self.connection().await?.execute_batch(sql).await
    }

    /// Drop the open connection, if any. The next use opens a fresh one.
    pub fn close(&mut self) {
        if self.connection.take().is_some() {
            info!(backend = %self.db_type, "closed connection");
        }
    }
}
