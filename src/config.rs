//! Connection configuration.
//!
//! A configuration file names a default backend and carries one settings block per
//! backend:
//! ```json
//! {
//!   "default": "sqlite",
//!   "connections": {
//!     "sqlite":   { "database": "database/database.sqlite" },
//!     "postgres": { "host": "localhost", "database": "app", "username": "root",
//!                   "password": "", "charset": "utf8", "schema": "public" }
//!   }
//! }
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SqlRecordError;
use crate::types::DatabaseType;

/// Backend-specific connection parameters.
///
/// Unknown keys (e.g. `collation`, `prefix`) are kept in `extra` rather than rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectionSettings {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub charset: Option<String>,
    #[serde(default)]
    pub schema: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl ConnectionSettings {
    /// Settings for an SQLite database at `path` (or `:memory:`).
    #[must_use]
    pub fn sqlite(path: impl Into<String>) -> Self {
        Self {
            database: Some(path.into()),
            ..Self::default()
        }
    }

    /// The `database` entry, required by every backend.
    ///
    /// # Errors
    /// Returns `SqlRecordError::ConfigError` when it is missing or blank.
    pub fn require_database(&self) -> Result<&str, SqlRecordError> {
        match self.database.as_deref() {
            Some(db) if !db.trim().is_empty() => Ok(db),
            _ => Err(SqlRecordError::ConfigError(
                "database is required".to_string(),
            )),
        }
    }
}

/// The whole configuration file: the default backend and a settings block per backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub connections: HashMap<String, ConnectionSettings>,
}

impl DatabaseConfig {
    /// A configuration with a single connection that is also the default.
    #[must_use]
    pub fn single(name: impl Into<String>, settings: ConnectionSettings) -> Self {
        let name = name.into();
        let mut connections = HashMap::new();
        connections.insert(name.clone(), settings);
        Self {
            default: Some(name),
            connections,
        }
    }

    /// Resolve the default backend and its settings.
    ///
    /// # Errors
    /// Returns `SqlRecordError::DriverNotFound` if no default is named, the named entry is
    /// absent, or the driver is not supported by this build.
    pub fn default_connection(&self) -> Result<(DatabaseType, &ConnectionSettings), SqlRecordError> {
        let name = self
            .default
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| {
                SqlRecordError::DriverNotFound("Default driver configuration not found.".into())
            })?;
        self.connection(name)
    }

    /// Resolve a named backend and its settings.
    ///
    /// # Errors
    /// Returns `SqlRecordError::DriverNotFound` if the entry is absent or unsupported.
    pub fn connection(
        &self,
        name: &str,
    ) -> Result<(DatabaseType, &ConnectionSettings), SqlRecordError> {
        let settings = self.connections.get(name).ok_or_else(|| {
            SqlRecordError::DriverNotFound(format!("Configuration for driver '{name}' not found."))
        })?;
        let db_type = DatabaseType::from_driver_name(name)?;
        Ok((db_type, settings))
    }
}

/// Reads [`DatabaseConfig`] files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load a JSON configuration file.
    ///
    /// # Errors
    /// Returns `SqlRecordError::ConfigFileNotFound` if `path` does not exist and
    /// `SqlRecordError::ConfigError` if it cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<DatabaseConfig, SqlRecordError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SqlRecordError::ConfigFileNotFound(path.to_path_buf()));
        }
        let text = fs::read_to_string(path).map_err(|e| {
            SqlRecordError::ConfigError(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::parse(&text)
    }

    /// Parse configuration text.
    ///
    /// # Errors
    /// Returns `SqlRecordError::ConfigError` on malformed JSON.
    pub fn parse(text: &str) -> Result<DatabaseConfig, SqlRecordError> {
        serde_json::from_str(text)
            .map_err(|e| SqlRecordError::ConfigError(format!("invalid configuration: {e}")))
    }
}
