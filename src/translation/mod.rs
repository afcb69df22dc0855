//! Placeholder scanning.
//!
//! Two rewrites share one lightweight lexer that skips quoted strings, comments and
//! dollar-quoted blocks:
//! - [`translate_placeholders`] converts numbered positional placeholders between the
//!   Postgres (`$N`) and SQLite (`?N`) spellings;
//! - [`bind_named_placeholders`] replaces `:name` placeholders with positional ones and
//!   returns the values in the order the placeholders appear in the text.
//!
//! `MySQL` placeholders are a bare `?`, so they carry no number and every value is
//! listed once per occurrence.

use std::borrow::Cow;
use std::collections::HashMap;

mod scanner;

use scanner::{State, enter_literal, scan_digits, scan_ident, step_literal};

use crate::error::SqlRecordError;
use crate::types::{DatabaseType, QueryAndParams, RowValues};

/// Target placeholder style for translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// PostgreSQL-style placeholders like `$1`.
    Postgres,
    /// SQLite-style placeholders like `?1`.
    Sqlite,
    /// MySQL-style unnumbered `?`.
    MySql,
}

impl PlaceholderStyle {
    fn sigil(self) -> char {
        match self {
            PlaceholderStyle::Postgres => '$',
            PlaceholderStyle::Sqlite | PlaceholderStyle::MySql => '?',
        }
    }

    fn is_numbered(self) -> bool {
        !matches!(self, PlaceholderStyle::MySql)
    }

    fn is_source_sigil(self, byte: u8) -> bool {
        match self {
            PlaceholderStyle::Postgres => byte == b'?',
            PlaceholderStyle::Sqlite => byte == b'$',
            PlaceholderStyle::MySql => byte == b'?' || byte == b'$',
        }
    }

    fn push_placeholder(self, buf: &mut String, number: &str) {
        buf.push(self.sigil());
        if self.is_numbered() {
            buf.push_str(number);
        }
    }
}

impl From<DatabaseType> for PlaceholderStyle {
    fn from(db_type: DatabaseType) -> Self {
        match db_type {
            #[cfg(feature = "postgres")]
            DatabaseType::Postgres => PlaceholderStyle::Postgres,
            #[cfg(feature = "sqlite")]
            DatabaseType::Sqlite => PlaceholderStyle::Sqlite,
            #[cfg(feature = "mysql")]
            DatabaseType::MySql => PlaceholderStyle::MySql,
        }
    }
}

/// Translate placeholders between Postgres-style `$N` and SQLite-style `?N`.
///
/// For [`PlaceholderStyle::MySql`] both spellings lose their number, which is only
/// correct when they already appear in order; [`bind_numbered_placeholders`] reorders
/// the values instead. Returns a borrowed `Cow` when no changes are needed.
///
/// ```rust
/// use sql_record::translation::{PlaceholderStyle, translate_placeholders};
///
/// let sql = translate_placeholders("select * from t where a = ?1", PlaceholderStyle::Postgres);
/// assert_eq!(sql, "select * from t where a = $1");
/// ```
#[must_use]
pub fn translate_placeholders(sql: &str, target: PlaceholderStyle) -> Cow<'_, str> {
    let mut out: Option<String> = None;
    let mut copied = 0;
    let mut state = State::Normal;
    let mut idx = 0;
    let bytes = sql.as_bytes();

    while idx < bytes.len() {
        if !matches!(state, State::Normal) {
            idx = step_literal(&mut state, bytes, idx) + 1;
            continue;
        }
        if let Some(last) = enter_literal(&mut state, bytes, idx) {
            idx = last + 1;
            continue;
        }

        if target.is_source_sigil(bytes[idx])
            && let Some((digits_end, digits)) = scan_digits(bytes, idx + 1)
        {
            let buf = out.get_or_insert_with(|| String::with_capacity(sql.len()));
            buf.push_str(&sql[copied..idx]);
            target.push_placeholder(buf, digits);
            copied = digits_end;
            idx = digits_end;
            continue;
        }
        idx += 1;
    }

    match out {
        Some(mut buf) => {
            buf.push_str(&sql[copied..]);
            Cow::Owned(buf)
        }
        None => Cow::Borrowed(sql),
    }
}

/// Replace `:name` placeholders with positional placeholders.
///
/// Values are looked up by name (without the leading colon) and appended to the
/// returned parameter list in the order their placeholders appear, so the list
/// always lines up with the rendered SQL. A name used twice is bound twice.
/// Postgres casts (`::text`) and anything inside literals or comments are left alone.
///
/// # Errors
/// Returns `SqlRecordError::ParameterError` if the SQL references a name with no value.
///
/// ```rust
/// use sql_record::prelude::*;
/// use sql_record::translation::{PlaceholderStyle, bind_named_placeholders};
///
/// let bound = bind_named_placeholders(
///     "select * from t where b = :b and a = :a",
///     &[("a".to_string(), RowValues::Int(1)), ("b".to_string(), RowValues::Int(2))],
///     PlaceholderStyle::Sqlite,
/// )?;
/// assert_eq!(bound.query, "select * from t where b = ?1 and a = ?2");
/// assert_eq!(bound.params, vec![RowValues::Int(2), RowValues::Int(1)]);
/// # Ok::<(), SqlRecordError>(())
/// ```
pub fn bind_named_placeholders(
    sql: &str,
    named: &[(String, RowValues)],
    target: PlaceholderStyle,
) -> Result<QueryAndParams, SqlRecordError> {
    let lookup: HashMap<&str, &RowValues> = named
        .iter()
        .map(|(name, value)| (name.trim_start_matches(':'), value))
        .collect();

    let mut buf = String::with_capacity(sql.len() + 8);
    let mut params = Vec::with_capacity(named.len());
    let mut copied = 0;
    let mut state = State::Normal;
    let mut idx = 0;
    let bytes = sql.as_bytes();

    while idx < bytes.len() {
        if !matches!(state, State::Normal) {
            idx = step_literal(&mut state, bytes, idx) + 1;
            continue;
        }
        if let Some(last) = enter_literal(&mut state, bytes, idx) {
            idx = last + 1;
            continue;
        }
        if bytes[idx] != b':' {
            idx += 1;
            continue;
        }
        if bytes.get(idx + 1) == Some(&b':') {
            // type cast
            idx += 2;
            continue;
        }
        let Some((name_end, name)) = scan_ident(bytes, idx + 1) else {
            idx += 1;
            continue;
        };
        let value = lookup.get(name).ok_or_else(|| {
            SqlRecordError::ParameterError(format!("no value bound for placeholder :{name}"))
        })?;
        params.push((*value).clone());
        buf.push_str(&sql[copied..idx]);
        target.push_placeholder(&mut buf, &params.len().to_string());
        copied = name_end;
        idx = name_end;
    }
    buf.push_str(&sql[copied..]);

    Ok(QueryAndParams::new(buf, params))
}

/// Render `?N`/`$N` placeholders for `target` and line the values up with them.
///
/// Numbered styles keep `values` as given. For [`PlaceholderStyle::MySql`] the value
/// list is rebuilt in placeholder order, so `$2 ... $1` binds the second value first.
///
/// # Errors
/// Returns `SqlRecordError::ParameterError` if a placeholder number has no value.
///
/// ```rust
/// use sql_record::prelude::*;
/// use sql_record::translation::{PlaceholderStyle, bind_numbered_placeholders};
///
/// let bound = bind_numbered_placeholders(
///     "select * from t where b = $2 and a = $1",
///     &[RowValues::Int(1), RowValues::Int(2)],
///     PlaceholderStyle::MySql,
/// )?;
/// assert_eq!(bound.query, "select * from t where b = ? and a = ?");
/// assert_eq!(bound.params, vec![RowValues::Int(2), RowValues::Int(1)]);
/// # Ok::<(), SqlRecordError>(())
/// ```
pub fn bind_numbered_placeholders(
    sql: &str,
    values: &[RowValues],
    target: PlaceholderStyle,
) -> Result<QueryAndParams, SqlRecordError> {
    if target.is_numbered() {
        return Ok(QueryAndParams::new(
            translate_placeholders(sql, target).into_owned(),
            values.to_vec(),
        ));
    }

    let mut buf = String::with_capacity(sql.len());
    let mut params = Vec::with_capacity(values.len());
    let mut copied = 0;
    let mut state = State::Normal;
    let mut idx = 0;
    let bytes = sql.as_bytes();

    while idx < bytes.len() {
        if !matches!(state, State::Normal) {
            idx = step_literal(&mut state, bytes, idx) + 1;
            continue;
        }
        if let Some(last) = enter_literal(&mut state, bytes, idx) {
            idx = last + 1;
            continue;
        }
        let Some((digits_end, digits)) = target
            .is_source_sigil(bytes[idx])
            .then(|| scan_digits(bytes, idx + 1))
            .flatten()
        else {
            idx += 1;
            continue;
        };
        let value = digits
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| values.get(i))
            .ok_or_else(|| {
                SqlRecordError::ParameterError(format!("no value bound for placeholder {digits}"))
            })?;
        params.push(value.clone());
        buf.push_str(&sql[copied..idx]);
        target.push_placeholder(&mut buf, digits);
        copied = digits_end;
        idx = digits_end;
    }
    buf.push_str(&sql[copied..]);

    Ok(QueryAndParams::new(buf, params))
}
