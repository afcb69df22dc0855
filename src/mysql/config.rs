use mysql_async::{Conn, OptsBuilder};
use tracing::info;

use crate::config::ConnectionSettings;
use crate::error::SqlRecordError;

use super::connection::MysqlConnection;

const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: u16 = 3306;

/// Options for opening a `MySQL` connection.
#[derive(Debug, Clone)]
pub struct MysqlOptions {
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: Option<String>,
    pub password: Option<String>,
    /// Applied with `SET NAMES` right after connecting.
    pub charset: Option<String>,
}

impl MysqlOptions {
    /// Build options from a configuration entry. `schema` has no meaning here.
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
            charset: settings.charset.clone(),
        })
    }

    fn init_statements(&self) -> Vec<String> {
        self.charset
            .as_deref()
            .filter(|c| !c.is_empty())
            .map(|charset| vec![format!("SET NAMES {charset}")])
            .unwrap_or_default()
    }

    /// Translate into `mysql_async` connection options.
    #[must_use]
    pub fn to_opts(&self) -> OptsBuilder {
        OptsBuilder::default()
            .ip_or_hostname(self.host.clone())
            .tcp_port(self.port)
            .db_name(Some(self.dbname.clone()))
            .user(self.user.clone())
            .pass(self.password.clone().filter(|p| !p.is_empty()))
            .init(self.init_statements())
    }

    /// Connect to the server.
    ///
    /// # Errors
    /// Returns `SqlRecordError::ConnectionError` if the server cannot be reached.
    pub async fn connect(self) -> Result<MysqlConnection, SqlRecordError> {
        let conn = Conn::new(self.to_opts()).await.map_err(|e| {
            SqlRecordError::ConnectionError(format!(
                "Failed to connect to MySQL at {}:{}: {e}",
                self.host, self.port
            ))
        })?;
        info!(host = %self.host, port = self.port, db = %self.dbname, "opened mysql connection");
        Ok(MysqlConnection::new(conn))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_charset() {
        let settings = ConnectionSettings {
            database: Some("app".into()),
            charset: Some("utf8mb4".into()),
            ..ConnectionSettings::default()
        };
        let opts = MysqlOptions::from_settings(&settings).unwrap();
        assert_eq!(opts.host, "localhost");
        assert_eq!(opts.port, 3306);
        assert_eq!(opts.init_statements(), vec!["SET NAMES utf8mb4".to_string()]);
    }

    #[test]
    fn database_is_required() {
        let err = MysqlOptions::from_settings(&ConnectionSettings::default()).unwrap_err();
        assert!(matches!(err, SqlRecordError::ConfigError(_)));
    }
}
