use chrono::NaiveDateTime;
use clap::ValueEnum;
use serde_json::Value as JsonValue;

use crate::error::SqlRecordError;

/// Values that can be stored in a database row or used as query parameters.
///
/// The same enum is used for model attributes, bind parameters and result
/// cells, so nothing above the backend modules branches on driver types:
/// ```rust
/// use sql_record::prelude::*;
///
/// let params = vec![
///     RowValues::Int(1),
///     RowValues::Text("alice".into()),
///     RowValues::Bool(true),
/// ];
/// assert_eq!(RowValues::from("alice"), params[1]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum RowValues {
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Text/string value
    Text(String),
    /// Boolean value
    Bool(bool),
    /// Timestamp value
    Timestamp(NaiveDateTime),
    /// NULL value
    Null,
    /// JSON value
    JSON(JsonValue),
    /// Binary data
    Blob(Vec<u8>),
}

impl RowValues {
    /// Check if this value is NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_int(&self) -> Option<&i64> {
        if let RowValues::Int(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let RowValues::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    /// Project the value into JSON for `to_json` style output.
    ///
    /// Timestamps are rendered as `YYYY-MM-DD HH:MM:SS[.fff]`, blobs as arrays of bytes.
    #[must_use]
    pub fn to_json_value(&self) -> JsonValue {
        match self {
            RowValues::Int(i) => JsonValue::from(*i),
            RowValues::Float(f) => JsonValue::from(*f),
            RowValues::Text(s) => JsonValue::from(s.as_str()),
            RowValues::Bool(b) => JsonValue::from(*b),
            RowValues::Timestamp(dt) => JsonValue::from(dt.format("%F %T%.f").to_string()),
            RowValues::Null => JsonValue::Null,
            RowValues::JSON(v) => v.clone(),
            RowValues::Blob(bytes) => JsonValue::from(bytes.clone()),
        }
    }
}

impl From<i64> for RowValues {
    fn from(value: i64) -> Self {
        RowValues::Int(value)
    }
}

impl From<i32> for RowValues {
    fn from(value: i32) -> Self {
        RowValues::Int(i64::from(value))
    }
}

impl From<f64> for RowValues {
    fn from(value: f64) -> Self {
        RowValues::Float(value)
    }
}

impl From<bool> for RowValues {
    fn from(value: bool) -> Self {
        RowValues::Bool(value)
    }
}

impl From<&str> for RowValues {
    fn from(value: &str) -> Self {
        RowValues::Text(value.to_string())
    }
}

impl From<String> for RowValues {
    fn from(value: String) -> Self {
        RowValues::Text(value)
    }
}

impl From<NaiveDateTime> for RowValues {
    fn from(value: NaiveDateTime) -> Self {
        RowValues::Timestamp(value)
    }
}

impl From<JsonValue> for RowValues {
    fn from(value: JsonValue) -> Self {
        RowValues::JSON(value)
    }
}

impl From<Vec<u8>> for RowValues {
    fn from(value: Vec<u8>) -> Self {
        RowValues::Blob(value)
    }
}

impl<T: Into<RowValues>> From<Option<T>> for RowValues {
    fn from(value: Option<T>) -> Self {
        value.map_or(RowValues::Null, Into::into)
    }
}

/// The backends this crate can talk to.
///
/// Names are parsed the same way on the command line and in configuration files,
/// case-insensitively, with `pgsql`/`postgresql` accepted for Postgres and `mariadb`
/// for `MySQL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum DatabaseType {
    /// `PostgreSQL` database
    #[cfg(feature = "postgres")]
    #[value(alias = "pgsql", alias = "postgresql")]
    Postgres,
    /// `SQLite` database
    #[cfg(feature = "sqlite")]
    Sqlite,
    /// `MySQL` or `MariaDB` database
    #[cfg(feature = "mysql")]
    #[value(name = "mysql", alias = "mariadb")]
    MySql,
}

impl DatabaseType {
    /// Resolve a configured driver name.
    ///
    /// # Errors
    /// Returns `SqlRecordError::DriverNotFound` when the name is unknown or the backend was
    /// not compiled into this build.
    pub fn from_driver_name(name: &str) -> Result<Self, SqlRecordError> {
        <Self as ValueEnum>::from_str(name.trim(), true)
            .map_err(|_| SqlRecordError::DriverNotFound(format!("Unsupported driver: {name}")))
    }

    /// Canonical driver name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            #[cfg(feature = "postgres")]
            DatabaseType::Postgres => "postgres",
            #[cfg(feature = "sqlite")]
            DatabaseType::Sqlite => "sqlite",
            #[cfg(feature = "mysql")]
            DatabaseType::MySql => "mysql",
        }
    }
}

impl std::fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A query and its parameters bundled together
///
/// The builder's compilers produce this; `query` is already rendered in the
/// placeholder syntax of the target backend and `params` is in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryAndParams {
    /// The SQL query string
    pub query: String,
    /// The parameters to be bound to the query
    pub params: Vec<RowValues>,
}

impl QueryAndParams {
    /// Create a new `QueryAndParams` with the given query string and parameters
    pub fn new(query: impl Into<String>, params: Vec<RowValues>) -> Self {
        Self {
            query: query.into(),
            params,
        }
    }

    /// Create a new `QueryAndParams` with no parameters
    pub fn new_without_params(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            params: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn driver_names_resolve_case_insensitively() {
        #[cfg(feature = "sqlite")]
        assert_eq!(
            DatabaseType::from_driver_name("SQLite").unwrap(),
            DatabaseType::Sqlite
        );
        #[cfg(feature = "postgres")]
        {
            assert_eq!(
                DatabaseType::from_driver_name("pgsql").unwrap(),
                DatabaseType::Postgres
            );
            assert_eq!(
                DatabaseType::from_driver_name("postgres").unwrap(),
                DatabaseType::Postgres
            );
        }
    }

    #[cfg(feature = "mysql")]
    #[test]
    fn mysql_and_mariadb_resolve() {
        assert_eq!(
            DatabaseType::from_driver_name("mysql").unwrap(),
            DatabaseType::MySql
        );
        assert_eq!(
            DatabaseType::from_driver_name("MariaDB").unwrap(),
            DatabaseType::MySql
        );
        assert_eq!(DatabaseType::MySql.to_string(), "mysql");
    }

    #[test]
    fn unknown_driver_is_not_found() {
        let err = DatabaseType::from_driver_name("oracle").unwrap_err();
        assert!(matches!(err, SqlRecordError::DriverNotFound(_)));
        assert_eq!(err.to_string(), "Driver not found: Unsupported driver: oracle");
    }

    #[test]
    fn option_converts_to_null() {
        assert_eq!(RowValues::from(None::<i64>), RowValues::Null);
        assert_eq!(RowValues::from(Some("x")), RowValues::Text("x".into()));
    }

    #[test]
    fn json_projection() {
        assert_eq!(RowValues::Int(3).to_json_value(), serde_json::json!(3));
        assert_eq!(RowValues::Null.to_json_value(), serde_json::Value::Null);
        assert_eq!(
            RowValues::Text("a".into()).to_json_value(),
            serde_json::json!("a")
        );
    }
}
