// MySQL backend
//
// - config: connecting from connection settings
// - params: RowValues -> mysql values
// - query: result extraction
// - connection: the shared connection and its operations

pub mod config;
pub mod connection;
pub mod params;
pub mod query;

pub use config::MysqlOptions;
pub use connection::MysqlConnection;
pub use params::Params;
