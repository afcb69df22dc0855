#![doc = include_str!("../README.md")]

pub mod config;
pub mod connection;
pub mod error;
pub mod model;
pub mod prelude;
pub mod query;
pub mod results;
pub mod translation;
pub mod types;

#[cfg(feature = "mysql")]
pub mod mysql;
#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use config::{ConfigLoader, ConnectionSettings, DatabaseConfig};
pub use connection::{Connection, Database};
pub use error::SqlRecordError;
pub use model::{Model, Record, RecordState};
pub use query::{Condition, Direction, FromRow, QueryBuilder, RawParams};
pub use results::{CustomDbRow, ResultSet};
pub use types::{DatabaseType, QueryAndParams, RowValues};
