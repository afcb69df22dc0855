use std::fmt::Write as _;
use std::sync::Arc;

use chrono::NaiveDate;
use mysql_async::consts::ColumnType;
use mysql_async::{Column, Row, Value};

use crate::error::SqlRecordError;
use crate::results::ResultSet;
use crate::types::RowValues;

// collation id of the `binary` character set
const BINARY_CHARSET: u16 = 63;

/// Map one `MySQL` value onto `RowValues`, using the column to tell text from binary.
///
/// Zero dates (`0000-00-00`) come back as `Null`. `TIME` values and unsigned integers
/// above `i64::MAX` come back as text.
#[must_use]
pub fn mysql_extract_value(column: &Column, value: Value) -> RowValues {
    match value {
        Value::NULL => RowValues::Null,
        Value::Int(i) => RowValues::Int(i),
        Value::UInt(u) => {
            i64::try_from(u).map_or_else(|_| RowValues::Text(u.to_string()), RowValues::Int)
        }
        Value::Float(f) => RowValues::Float(f64::from(f)),
        Value::Double(f) => RowValues::Float(f),
        Value::Date(year, month, day, hour, minute, second, micros) => {
            NaiveDate::from_ymd_opt(i32::from(year), u32::from(month), u32::from(day))
                .and_then(|date| {
                    date.and_hms_micro_opt(
                        u32::from(hour),
                        u32::from(minute),
                        u32::from(second),
                        micros,
                    )
                })
                .map_or(RowValues::Null, RowValues::Timestamp)
        }
        Value::Time(negative, days, hours, minutes, seconds, micros) => {
            let sign = if negative { "-" } else { "" };
            let hours = days * 24 + u32::from(hours);
            let mut text = format!("{sign}{hours:02}:{minutes:02}:{seconds:02}");
            if micros > 0 {
                let _ = write!(text, ".{micros:06}");
            }
            RowValues::Text(text)
        }
        Value::Bytes(bytes) => bytes_value(column, bytes),
    }
}

fn bytes_value(column: &Column, bytes: Vec<u8>) -> RowValues {
    if column.column_type() == ColumnType::MYSQL_TYPE_JSON
        && let Ok(json) = serde_json::from_slice(&bytes)
    {
        return RowValues::JSON(json);
    }
    if column.character_set() == BINARY_CHARSET {
        return RowValues::Blob(bytes);
    }
    match String::from_utf8(bytes) {
        Ok(text) => RowValues::Text(text),
        Err(e) => RowValues::Blob(e.into_bytes()),
    }
}

/// Build a result set from the statement's columns and its fetched rows.
///
/// # Errors
/// Returns `ExecutionError` if a row is shorter than the column list.
pub fn build_result_set(columns: &[Column], rows: Vec<Row>) -> Result<ResultSet, SqlRecordError> {
    let column_names: Vec<String> = columns
        .iter()
        .map(|col| col.name_str().into_owned())
        .collect();

    let mut result_set = ResultSet::with_capacity(rows.len());
    result_set.set_column_names(Arc::new(column_names));

    for row in rows {
        let mut row_values = Vec::with_capacity(columns.len());
        for (idx, column) in columns.iter().enumerate() {
            let value = row.as_ref(idx).cloned().ok_or_else(|| {
                SqlRecordError::ExecutionError(format!("mysql row has no column {idx}"))
            })?;
            row_values.push(mysql_extract_value(column, value));
        }
        result_set.add_row_values(row_values);
    }

    Ok(result_set)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(ty: ColumnType, charset: u16) -> Column {
        Column::new(ty).with_character_set(charset)
    }

    #[test]
    fn text_and_binary_columns() {
        let text = column(ColumnType::MYSQL_TYPE_VAR_STRING, 45);
        let blob = column(ColumnType::MYSQL_TYPE_BLOB, BINARY_CHARSET);
        assert_eq!(
            mysql_extract_value(&text, Value::Bytes(b"ana".to_vec())),
            RowValues::Text("ana".into())
        );
        assert_eq!(
            mysql_extract_value(&blob, Value::Bytes(vec![0, 159])),
            RowValues::Blob(vec![0, 159])
        );
    }

    #[test]
    fn json_column_is_parsed() {
        let col = column(ColumnType::MYSQL_TYPE_JSON, BINARY_CHARSET);
        assert_eq!(
            mysql_extract_value(&col, Value::Bytes(br#"{"a":1}"#.to_vec())),
            RowValues::JSON(serde_json::json!({"a": 1}))
        );
    }

    #[test]
    fn dates_and_times() {
        let col = column(ColumnType::MYSQL_TYPE_DATETIME, BINARY_CHARSET);
        let ts = NaiveDate::from_ymd_opt(2024, 5, 6)
            .unwrap()
            .and_hms_opt(7, 8, 9)
            .unwrap();
        assert_eq!(
            mysql_extract_value(&col, Value::Date(2024, 5, 6, 7, 8, 9, 0)),
            RowValues::Timestamp(ts)
        );
        assert_eq!(
            mysql_extract_value(&col, Value::Date(0, 0, 0, 0, 0, 0, 0)),
            RowValues::Null
        );
        let time = column(ColumnType::MYSQL_TYPE_TIME, BINARY_CHARSET);
        assert_eq!(
            mysql_extract_value(&time, Value::Time(true, 1, 2, 3, 4, 0)),
            RowValues::Text("-26:03:04".into())
        );
    }

    #[test]
    fn large_unsigned_falls_back_to_text() {
        let col = column(ColumnType::MYSQL_TYPE_LONGLONG, BINARY_CHARSET);
        assert_eq!(
            mysql_extract_value(&col, Value::UInt(u64::MAX)),
            RowValues::Text(u64::MAX.to_string())
        );
        assert_eq!(mysql_extract_value(&col, Value::UInt(5)), RowValues::Int(5));
    }
}
