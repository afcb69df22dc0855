use tracing::info;

use crate::config::ConnectionSettings;
use crate::error::SqlRecordError;

use super::connection::SqliteConnection;

const MEMORY_PATH: &str = ":memory:";

/// Options for opening a `SQLite` database.
#[derive(Debug, Clone)]
pub struct SqliteOptions {
    pub db_path: String,
}

impl SqliteOptions {
    #[must_use]
    pub fn new(db_path: String) -> Self {
        Self { db_path }
    }

    /// Build options from a configuration entry; only `database` is used.
    ///
    /// # Errors
    /// Returns `SqlRecordError::ConfigError` when `database` is missing.
    pub fn from_settings(settings: &ConnectionSettings) -> Result<Self, SqlRecordError> {
        Ok(Self::new(settings.require_database()?.to_string()))
    }

    fn is_memory(&self) -> bool {
        self.db_path == MEMORY_PATH
    }

    /// Open the database. File databases are switched to WAL journaling.
    ///
    /// # Errors
    /// Returns `SqlRecordError::ConnectionError` if the file cannot be opened.
    pub async fn connect(self) -> Result<SqliteConnection, SqlRecordError> {
        let path = self.db_path.clone();
        let is_memory = self.is_memory();
        let raw = tokio::task::spawn_blocking(move || {
            if is_memory {
                rusqlite::Connection::open_in_memory()
            } else {
                rusqlite::Connection::open(&path)
            }
        })
        .await
        .map_err(|e| SqlRecordError::ConnectionError(format!("sqlite open task failed: {e}")))?
        .map_err(|e| {
            SqlRecordError::ConnectionError(format!(
                "Failed to open SQLite database {}: {e}",
                self.db_path
            ))
        })?;

        let conn = SqliteConnection::new(raw, self.db_path.clone());
        if !is_memory {
            apply_wal_pragmas(&conn).await?;
        }
        info!(path = %self.db_path, "opened sqlite connection");
        Ok(conn)
    }
}

async fn apply_wal_pragmas(conn: &SqliteConnection) -> Result<(), SqlRecordError> {
    conn.with_connection(|guard| {
        // journal_mode returns a row, so query instead of execute
        guard.query_row("PRAGMA journal_mode = WAL;", [], |_| Ok(()))?;
        Ok(())
    })
    .await
}
