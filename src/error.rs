use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SqlRecordError {
    #[cfg(feature = "postgres")]
    #[error(transparent)]
    PostgresError(#[from] tokio_postgres::Error),

    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[cfg(feature = "mysql")]
    #[error(transparent)]
    MysqlError(#[from] mysql_async::Error),

    #[error(transparent)]
    JsonError(#[from] serde_json::Error),

    #[error("Config file not found at: {}", .0.display())]
    ConfigFileNotFound(PathBuf),

    #[error("Driver not found: {0}")]
    DriverNotFound(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Parameter conversion error: {0}")]
    ParameterError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),

    #[error("Usage error: {0}")]
    UsageError(String),

    #[error("{0}")]
    NotFound(String),
}

impl SqlRecordError {
    /// True for the "OrFail" lookups that found nothing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// True for misuse of the builder or model API (no SQL was sent).
    #[must_use]
    pub fn is_usage(&self) -> bool {
        matches!(self, Self::UsageError(_))
    }
}
