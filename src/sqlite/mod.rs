// SQLite backend
//
// - config: opening a database from connection settings
// - params: RowValues -> rusqlite values
// - query: result extraction
// - connection: the shared connection and its operations

pub mod config;
pub mod connection;
pub mod params;
pub mod query;

pub use config::SqliteOptions;
pub use connection::SqliteConnection;
pub use params::Params;
pub use query::build_result_set;
