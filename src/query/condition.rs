use std::sync::atomic::{AtomicU64, Ordering};

use crate::types::RowValues;

static PLACEHOLDER_SEQ: AtomicU64 = AtomicU64::new(1);

/// One `column operator value` comparison with its own bind placeholder.
///
/// The placeholder is the column name with every character outside `[A-Za-z0-9_]`
/// replaced by `_`, followed by a process-wide sequence number, so two conditions on
/// the same column never share a name.
///
/// ```rust
/// use sql_record::prelude::*;
///
/// let a = Condition::new("users.age", ">", 18);
/// let b = Condition::new("users.age", ">", 21);
/// assert!(a.placeholder().starts_with("users_age_"));
/// assert_ne!(a.placeholder(), b.placeholder());
/// assert_eq!(a.to_sql(), format!("users.age > :{}", a.placeholder()));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    column: String,
    operator: String,
    value: RowValues,
    placeholder: String,
}

impl Condition {
    /// `column` and `operator` are written into the SQL verbatim.
    pub fn new(
        column: impl Into<String>,
        operator: impl Into<String>,
        value: impl Into<RowValues>,
    ) -> Self {
        let column = column.into();
        let seq = PLACEHOLDER_SEQ.fetch_add(1, Ordering::Relaxed);
        let placeholder = format!("{}_{seq}", sanitize_placeholder(&column));
        Self {
            column,
            operator: operator.into(),
            value: value.into(),
            placeholder,
        }
    }

    #[must_use]
    pub fn column(&self) -> &str {
        &self.column
    }

    #[must_use]
    pub fn operator(&self) -> &str {
        &self.operator
    }

    #[must_use]
    pub fn value(&self) -> &RowValues {
        &self.value
    }

    /// Placeholder name without the leading colon.
    #[must_use]
    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    /// `"<column> <operator> :<placeholder>"`
    #[must_use]
    pub fn to_sql(&self) -> String {
        self.to_sql_as(&self.placeholder)
    }

    /// Like [`to_sql`](Self::to_sql) with another placeholder name.
    pub(crate) fn to_sql_as(&self, placeholder: &str) -> String {
        format!("{} {} :{placeholder}", self.column, self.operator)
    }

    /// The `(placeholder, value)` pair to bind.
    pub(crate) fn binding(&self) -> (String, RowValues) {
        (self.placeholder.clone(), self.value.clone())
    }
}

/// Map a column name onto a valid bind name.
pub(crate) fn sanitize_placeholder(column: &str) -> String {
    let mut name: String = column
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if !name.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
        name.insert(0, 'c');
    }
    name
}
