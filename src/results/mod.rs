mod result_set;
mod row;

pub use result_set::ResultSet;
pub use row::CustomDbRow;
