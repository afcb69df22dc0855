use std::fmt::Write as _;

use tokio_postgres::NoTls;
use tracing::{error, info};

use crate::config::ConnectionSettings;
use crate::error::SqlRecordError;

use super::connection::PostgresConnection;

const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: u16 = 5432;

/// Options for opening a Postgres connection.
#[derive(Debug, Clone)]
pub struct PostgresOptions {
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: Option<String>,
    pub password: Option<String>,
    /// Sent as the `search_path` run-time parameter.
    pub schema: Option<String>,
    /// Sent as the `client_encoding` run-time parameter.
    pub charset: Option<String>,
}

impl PostgresOptions {
    /// Build options from a configuration entry.
    ///
    /// # Errors
    /// Returns `SqlRecordError::ConfigError` when `database` is missing.
    pub fn from_settings(settings: &ConnectionSettings) -> Result<Self, SqlRecordError> {
        Ok(Self {
            host: settings
                .host
                .clone()
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: settings.port.unwrap_or(DEFAULT_PORT),
            dbname: settings.require_database()?.to_string(),
            user: settings.username.clone(),
            password: settings.password.clone(),
            schema: settings.schema.clone(),
            charset: settings.charset.clone(),
        })
    }

    /// Translate into a `tokio_postgres::Config`.
    #[must_use]
    pub fn to_pg_config(&self) -> tokio_postgres::Config {
        let mut cfg = tokio_postgres::Config::new();
        cfg.host(&self.host).port(self.port).dbname(&self.dbname);
        if let Some(user) = &self.user {
            cfg.user(user);
        }
        if let Some(password) = self.password.as_deref().filter(|p| !p.is_empty()) {
            cfg.password(password);
        }
        let options = self.runtime_options();
        if !options.is_empty() {
            cfg.options(&options);
        }
        cfg
    }

    fn runtime_options(&self) -> String {
        let mut options = String::new();
        if let Some(schema) = self.schema.as_deref().filter(|s| !s.is_empty()) {
            let _ = write!(options, "-c search_path={schema}");
        }
        if let Some(charset) = self.charset.as_deref().filter(|s| !s.is_empty()) {
            if !options.is_empty() {
                options.push(' ');
            }
            let _ = write!(options, "-c client_encoding={charset}");
        }
        options
    }

    /// Connect and spawn the task that drives the connection.
    ///
    /// # Errors
    /// Returns `SqlRecordError::ConnectionError` if the server cannot be reached.
    pub async fn connect(self) -> Result<PostgresConnection, SqlRecordError> {
        let (client, connection) = self.to_pg_config().connect(NoTls).await.map_err(|e| {
            SqlRecordError::ConnectionError(format!(
                "Failed to connect to Postgres at {}:{}: {e}",
                self.host, self.port
            ))
        })?;
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!(error = %e, "postgres connection task ended");
            }
        });
        info!(host = %self.host, port = self.port, db = %self.dbname, "opened postgres connection");
        Ok(PostgresConnection::new(client))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_runtime_options() {
        let settings = ConnectionSettings {
            database: Some("app".into()),
            schema: Some("public".into()),
            charset: Some("utf8".into()),
            ..ConnectionSettings::default()
        };
        let opts = PostgresOptions::from_settings(&settings).unwrap();
        assert_eq!(opts.host, "localhost");
        assert_eq!(opts.port, 5432);
        assert_eq!(
            opts.runtime_options(),
            "-c search_path=public -c client_encoding=utf8"
        );
    }

    #[test]
    fn database_is_required() {
        let err = PostgresOptions::from_settings(&ConnectionSettings::default()).unwrap_err();
        assert!(matches!(err, SqlRecordError::ConfigError(_)));
    }
}
