use mysql_async::Value;

use crate::types::RowValues;

/// Convert a single `RowValues` to a `mysql_async` `Value`.
///
/// Booleans become `0`/`1`. Timestamps and JSON are sent as text and cast by the
/// server to the column type.
#[must_use]
pub fn row_value_to_mysql_value(value: &RowValues) -> Value {
    match value {
        RowValues::Int(i) => Value::Int(*i),
        RowValues::Float(f) => Value::Double(*f),
        RowValues::Text(s) => Value::Bytes(s.clone().into_bytes()),
        RowValues::Bool(b) => Value::Int(i64::from(*b)),
        RowValues::Timestamp(dt) => Value::Bytes(dt.format("%F %T%.f").to_string().into_bytes()),
        RowValues::Null => Value::NULL,
        RowValues::JSON(jval) => Value::Bytes(jval.to_string().into_bytes()),
        RowValues::Blob(bytes) => Value::Bytes(bytes.clone()),
    }
}

/// Owned `MySQL` parameters for one statement.
#[derive(Debug, Clone, Default)]
pub struct Params(pub Vec<Value>);

impl Params {
    #[must_use]
    pub fn convert(params: &[RowValues]) -> Self {
        Params(params.iter().map(row_value_to_mysql_value).collect())
    }
}

impl From<Params> for mysql_async::Params {
    fn from(params: Params) -> Self {
        if params.0.is_empty() {
            mysql_async::Params::Empty
        } else {
            mysql_async::Params::Positional(params.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn text_like_values_travel_as_bytes() {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap();
        let params = Params::convert(&[
            RowValues::Bool(false),
            RowValues::Text("ana".into()),
            RowValues::Timestamp(ts),
            RowValues::Null,
        ]);
        assert_eq!(
            params.0,
            vec![
                Value::Int(0),
                Value::Bytes(b"ana".to_vec()),
                Value::Bytes(b"2024-01-02 03:04:05".to_vec()),
                Value::NULL,
            ]
        );
    }

    #[test]
    fn no_values_means_no_params() {
        let params: mysql_async::Params = Params::convert(&[]).into();
        assert_eq!(params, mysql_async::Params::Empty);
    }
}
