//! Convenient imports for common functionality.
//!
//! `use sql_record::prelude::*;` brings in the database context, the builder, the
//! model trait and the value types.

pub use crate::config::{ConfigLoader, ConnectionSettings, DatabaseConfig};
pub use crate::connection::{Connection, Database};
pub use crate::error::SqlRecordError;
pub use crate::model::{Model, Record, RecordState};
pub use crate::query::{Condition, Direction, FromRow, QueryBuilder, RawParams};
pub use crate::results::{CustomDbRow, ResultSet};
pub use crate::translation::{PlaceholderStyle, translate_placeholders};
pub use crate::types::{DatabaseType, QueryAndParams, RowValues};
