// PostgreSQL backend
//
// - config: connecting from connection settings
// - params: RowValues -> wire values
// - query: result extraction
// - connection: the client and its operations

pub mod config;
pub mod connection;
pub mod params;
pub mod query;

pub use config::PostgresOptions;
pub use connection::PostgresConnection;
pub use params::Params;
