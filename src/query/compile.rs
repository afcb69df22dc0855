//! Statement rendering.
//!
//! Every statement is first written with named placeholders and then rendered to the
//! backend's positional syntax by [`bind_named_placeholders`], which appends values in
//! the order their placeholders appear. That keeps the parameter list aligned with the
//! SQL no matter how clauses were added.

use std::fmt::Write as _;

use super::builder::QueryBuilder;
use super::condition::{Condition, sanitize_placeholder};
use crate::error::SqlRecordError;
use crate::translation::bind_named_placeholders;
use crate::types::{DatabaseType, QueryAndParams, RowValues};

type Named = Vec<(String, RowValues)>;

impl<T> QueryBuilder<'_, T> {
    /// Render the `SELECT` that [`get`](Self::get) would run.
    ///
    /// # Errors
    /// Returns `ParameterError` only if rendering loses track of a placeholder.
    pub fn to_select_sql(&self, db_type: DatabaseType) -> Result<QueryAndParams, SqlRecordError> {
        let fields = if self.fields.is_empty() {
            "*".to_string()
        } else {
            self.fields.join(", ")
        };
        let mut sql = format!("SELECT {fields}");
        let mut named = Named::new();
        self.push_from(&mut sql);
        self.push_where(&mut sql, &mut named);
        self.push_grouping(&mut sql, &mut named);
        self.push_ordering(&mut sql, db_type);
        render(&sql, &named, db_type)
    }

    pub(crate) fn compile_count(
        &self,
        db_type: DatabaseType,
    ) -> Result<QueryAndParams, SqlRecordError> {
        let mut sql = String::from("SELECT COUNT(*)");
        let mut named = Named::new();
        self.push_from(&mut sql);
        self.push_where(&mut sql, &mut named);
        render(&sql, &named, db_type)
    }

    pub(crate) fn compile_pluck(
        &self,
        column: &str,
        db_type: DatabaseType,
    ) -> Result<QueryAndParams, SqlRecordError> {
        let mut sql = format!("SELECT {column}");
        let mut named = Named::new();
        self.push_from(&mut sql);
        self.push_where(&mut sql, &mut named);
        self.push_grouping(&mut sql, &mut named);
        self.push_ordering(&mut sql, db_type);
        render(&sql, &named, db_type)
    }

    pub(crate) fn compile_insert(
        &self,
        data: &[(String, RowValues)],
        db_type: DatabaseType,
    ) -> Result<QueryAndParams, SqlRecordError> {
        let mut sql = format!("INSERT INTO {}", self.table);
        let mut named = Named::new();
        if data.is_empty() {
            sql.push_str(empty_insert(db_type));
        } else {
            let mut columns = Vec::with_capacity(data.len());
            let mut placeholders = Vec::with_capacity(data.len());
            for (column, value) in data {
                let name = column_placeholder("", column, &named);
                columns.push(column.as_str());
                placeholders.push(format!(":{name}"));
                named.push((name, value.clone()));
            }
            let _ = write!(
                sql,
                " ({}) VALUES ({})",
                columns.join(", "),
                placeholders.join(", ")
            );
        }
        if returns_id(db_type) {
            sql.push_str(" RETURNING id");
        }
        render(&sql, &named, db_type)
    }

    pub(crate) fn compile_update(
        &self,
        data: &[(String, RowValues)],
        keys: &[(String, RowValues)],
        db_type: DatabaseType,
    ) -> Result<QueryAndParams, SqlRecordError> {
        let mut named = Named::new();
        let mut sets = Vec::with_capacity(data.len());
        for (column, value) in data {
            let name = column_placeholder("set_", column, &named);
            sets.push(format!("{column} = :{name}"));
            named.push((name, value.clone()));
        }
        let mut sql = format!("UPDATE {} SET {}", self.table, sets.join(", "));

        let mut predicates = Vec::with_capacity(keys.len() + self.wheres.len());
        for (column, value) in keys {
            let name = column_placeholder("key_", column, &named);
            predicates.push(format!("{column} = :{name}"));
            named.push((name, value.clone()));
        }
        for condition in &self.wheres {
            let name = unique_placeholder(condition.placeholder().to_string(), &named);
            predicates.push(condition.to_sql_as(&name));
            named.push((name, condition.value().clone()));
        }
        if !predicates.is_empty() {
            let _ = write!(sql, " WHERE {}", predicates.join(" AND "));
        }
        render(&sql, &named, db_type)
    }

    pub(crate) fn compile_delete(
        &self,
        db_type: DatabaseType,
    ) -> Result<QueryAndParams, SqlRecordError> {
        if self.wheres.is_empty() {
            return Err(SqlRecordError::UsageError(
                "No conditions provided for delete operation.".into(),
            ));
        }
        let mut sql = format!("DELETE FROM {}", self.table);
        let mut named = Named::new();
        self.push_where(&mut sql, &mut named);
        render(&sql, &named, db_type)
    }

    fn push_from(&self, sql: &mut String) {
        let _ = write!(sql, " FROM {}", self.table);
        for join in &self.joins {
            let _ = write!(
                sql,
                " JOIN {} ON {} {} {}",
                join.table, join.left, join.operator, join.right
            );
        }
    }

    fn push_where(&self, sql: &mut String, named: &mut Named) {
        push_conditions(sql, " WHERE ", &self.wheres, named);
    }

    fn push_grouping(&self, sql: &mut String, named: &mut Named) {
        if let Some(group_by) = &self.group_by {
            let _ = write!(sql, " GROUP BY {group_by}");
        }
        push_conditions(sql, " HAVING ", &self.havings, named);
    }

    fn push_ordering(&self, sql: &mut String, db_type: DatabaseType) {
        if !self.orders.is_empty() {
            let orders: Vec<String> = self
                .orders
                .iter()
                .map(|(column, direction)| format!("{column} {direction}"))
                .collect();
            let _ = write!(sql, " ORDER BY {}", orders.join(", "));
        }
        match (self.limit, self.offset) {
            (Some(limit), offset) => {
                let _ = write!(sql, " LIMIT {limit}");
                if let Some(offset) = offset {
                    let _ = write!(sql, " OFFSET {offset}");
                }
            }
            (None, Some(offset)) => {
                if let Some(unbounded) = unbounded_limit(db_type) {
                    let _ = write!(sql, " LIMIT {unbounded}");
                }
                let _ = write!(sql, " OFFSET {offset}");
            }
            (None, None) => {}
        }
    }
}

fn push_conditions(sql: &mut String, keyword: &str, conditions: &[Condition], named: &mut Named) {
    if conditions.is_empty() {
        return;
    }
    let parts: Vec<String> = conditions.iter().map(Condition::to_sql).collect();
    sql.push_str(keyword);
    sql.push_str(&parts.join(" AND "));
    named.extend(conditions.iter().map(Condition::binding));
}

/// `<prefix><column>`, suffixed when another placeholder already took the name.
fn column_placeholder(prefix: &str, column: &str, named: &Named) -> String {
    unique_placeholder(format!("{prefix}{}", sanitize_placeholder(column)), named)
}

fn unique_placeholder(base: String, named: &Named) -> String {
    let taken = |name: &str| named.iter().any(|(existing, _)| existing == name);
    if !taken(&base) {
        return base;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{base}_{n}");
        if !taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

fn returns_id(db_type: DatabaseType) -> bool {
    match db_type {
        #[cfg(feature = "postgres")]
        DatabaseType::Postgres => true,
        #[cfg(feature = "sqlite")]
        DatabaseType::Sqlite => false,
        #[cfg(feature = "mysql")]
        DatabaseType::MySql => false,
    }
}

fn empty_insert(db_type: DatabaseType) -> &'static str {
    match db_type {
        #[cfg(feature = "postgres")]
        DatabaseType::Postgres => " DEFAULT VALUES",
        #[cfg(feature = "sqlite")]
        DatabaseType::Sqlite => " DEFAULT VALUES",
        #[cfg(feature = "mysql")]
        DatabaseType::MySql => " () VALUES ()",
    }
}

// SQLite and MySQL only accept OFFSET after a LIMIT
fn unbounded_limit(db_type: DatabaseType) -> Option<&'static str> {
    match db_type {
        #[cfg(feature = "postgres")]
        DatabaseType::Postgres => None,
        #[cfg(feature = "sqlite")]
        DatabaseType::Sqlite => Some("-1"),
        #[cfg(feature = "mysql")]
        DatabaseType::MySql => Some("18446744073709551615"),
    }
}

fn render(sql: &str, named: &Named, db_type: DatabaseType) -> Result<QueryAndParams, SqlRecordError> {
    bind_named_placeholders(sql, named, db_type.into())
}

#[cfg(all(test, feature = "sqlite", feature = "postgres"))]
mod tests {
    use super::*;
    use crate::connection::Database;
    use crate::query::Direction;

    const SQLITE: DatabaseType = DatabaseType::Sqlite;
    const PG: DatabaseType = DatabaseType::Postgres;

    fn cols(pairs: &[(&str, RowValues)]) -> Vec<(String, RowValues)> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn plain_select() {
        let db = Database::sqlite(":memory:");
        let stmt = db.table("users").to_select_sql(SQLITE).unwrap();
        assert_eq!(stmt.query, "SELECT * FROM users");
        assert!(stmt.params.is_empty());
    }

    #[test]
    fn clauses_render_in_sql_order_whatever_the_call_order() {
        let db = Database::sqlite(":memory:");
        let stmt = db
            .table("users")
            .order_by("name", Direction::Desc)
            .limit(10)
            .filter("age", ">", 18)
            .select(["name", "age"])
            .offset(20)
            .to_select_sql(PG)
            .unwrap();
        assert_eq!(
            stmt.query,
            "SELECT name, age FROM users WHERE age > $1 ORDER BY name DESC LIMIT 10 OFFSET 20"
        );
        assert_eq!(stmt.params, vec![RowValues::Int(18)]);
    }

    #[test]
    fn where_and_having_bind_in_placeholder_order() {
        let db = Database::sqlite(":memory:");
        let stmt = db
            .table("orders")
            .having("COUNT(*)", ">", 5)
            .select(["user_id", "COUNT(*) AS n"])
            .group_by("user_id")
            .filter("status", "=", "paid")
            .join("users", "users.id", "=", "orders.user_id")
            .filter("users.active", "=", true)
            .to_select_sql(SQLITE)
            .unwrap();
        assert_eq!(
            stmt.query,
            "SELECT user_id, COUNT(*) AS n FROM orders \
             JOIN users ON users.id = orders.user_id \
             WHERE status = ?1 AND users.active = ?2 \
             GROUP BY user_id HAVING COUNT(*) > ?3"
        );
        assert_eq!(
            stmt.params,
            vec![
                RowValues::Text("paid".into()),
                RowValues::Bool(true),
                RowValues::Int(5)
            ]
        );
    }

    #[test]
    fn offset_without_limit() {
        let db = Database::sqlite(":memory:");
        let sqlite = db.table("t").offset(5).to_select_sql(SQLITE).unwrap();
        assert_eq!(sqlite.query, "SELECT * FROM t LIMIT -1 OFFSET 5");
        let pg = db.table("t").offset(5).to_select_sql(PG).unwrap();
        assert_eq!(pg.query, "SELECT * FROM t OFFSET 5");
    }

    #[cfg(feature = "mysql")]
    #[test]
    fn mysql_dialect() {
        let db = Database::sqlite(":memory:");
        let paged = db
            .table("t")
            .filter("a", "=", 1)
            .offset(5)
            .to_select_sql(DatabaseType::MySql)
            .unwrap();
        assert_eq!(
            paged.query,
            "SELECT * FROM t WHERE a = ? LIMIT 18446744073709551615 OFFSET 5"
        );
        let insert = db
            .table("users")
            .compile_insert(&cols(&[("name", "ana".into())]), DatabaseType::MySql)
            .unwrap();
        assert_eq!(insert.query, "INSERT INTO users (name) VALUES (?)");
        let empty = db
            .table("events")
            .compile_insert(&[], DatabaseType::MySql)
            .unwrap();
        assert_eq!(empty.query, "INSERT INTO events () VALUES ()");
    }

    #[test]
    fn count_ignores_projection_and_ordering() {
        let db = Database::sqlite(":memory:");
        let stmt = db
            .table("users")
            .select(["name"])
            .order_by("name", Direction::Asc)
            .filter("age", ">", 18)
            .compile_count(SQLITE)
            .unwrap();
        assert_eq!(stmt.query, "SELECT COUNT(*) FROM users WHERE age > ?1");
    }

    #[test]
    fn pluck_keeps_ordering_and_limit() {
        let db = Database::sqlite(":memory:");
        let stmt = db
            .table("users")
            .select(["ignored"])
            .order_by("name", Direction::Asc)
            .limit(3)
            .compile_pluck("name", SQLITE)
            .unwrap();
        assert_eq!(stmt.query, "SELECT name FROM users ORDER BY name ASC LIMIT 3");
    }

    #[test]
    fn insert_uses_column_placeholders() {
        let db = Database::sqlite(":memory:");
        let data = cols(&[("name", "ana".into()), ("age", 30.into())]);
        let sqlite = db.table("users").compile_insert(&data, SQLITE).unwrap();
        assert_eq!(sqlite.query, "INSERT INTO users (name, age) VALUES (?1, ?2)");
        assert_eq!(
            sqlite.params,
            vec![RowValues::Text("ana".into()), RowValues::Int(30)]
        );
        let pg = db.table("users").compile_insert(&data, PG).unwrap();
        assert_eq!(
            pg.query,
            "INSERT INTO users (name, age) VALUES ($1, $2) RETURNING id"
        );
    }

    #[test]
    fn empty_insert_uses_defaults() {
        let db = Database::sqlite(":memory:");
        let stmt = db.table("events").compile_insert(&[], SQLITE).unwrap();
        assert_eq!(stmt.query, "INSERT INTO events DEFAULT VALUES");
    }

    #[test]
    fn update_namespaces_set_and_key_placeholders() {
        let db = Database::sqlite(":memory:");
        let stmt = db
            .table("users")
            .compile_update(
                &cols(&[("id", 5.into()), ("name", "x".into())]),
                &cols(&[("id", 3.into())]),
                SQLITE,
            )
            .unwrap();
        assert_eq!(stmt.query, "UPDATE users SET id = ?1, name = ?2 WHERE id = ?3");
        assert_eq!(
            stmt.params,
            vec![RowValues::Int(5), RowValues::Text("x".into()), RowValues::Int(3)]
        );
    }

    #[test]
    fn update_ands_builder_filters() {
        let db = Database::sqlite(":memory:");
        let stmt = db
            .table("users")
            .filter("active", "=", false)
            .compile_update(&cols(&[("role", "guest".into())]), &[], PG)
            .unwrap();
        assert_eq!(stmt.query, "UPDATE users SET role = $1 WHERE active = $2");
        assert_eq!(
            stmt.params,
            vec![RowValues::Text("guest".into()), RowValues::Bool(false)]
        );
    }

    #[test]
    fn delete_requires_a_filter() {
        let db = Database::sqlite(":memory:");
        assert!(db.table("users").compile_delete(SQLITE).unwrap_err().is_usage());
        let stmt = db
            .table("users")
            .filter("id", "=", 9)
            .compile_delete(SQLITE)
            .unwrap();
        assert_eq!(stmt.query, "DELETE FROM users WHERE id = ?1");
    }

    #[test]
    fn update_filter_cannot_reuse_a_key_placeholder() {
        let db = Database::sqlite(":memory:");
        let builder = db.table("t").filter("key_id", "=", 1);
        // pick a key column whose `key_` name equals the filter's placeholder
        let seq = builder.wheres[0]
            .placeholder()
            .strip_prefix("key_id_")
            .unwrap()
            .to_string();
        let key_column = format!("id_{seq}");
        let stmt = builder
            .compile_update(
                &cols(&[("name", "x".into())]),
                &cols(&[(key_column.as_str(), 2.into())]),
                SQLITE,
            )
            .unwrap();
        assert_eq!(
            stmt.query,
            format!("UPDATE t SET name = ?1 WHERE {key_column} = ?2 AND key_id = ?3")
        );
        assert_eq!(
            stmt.params,
            vec![RowValues::Text("x".into()), RowValues::Int(2), RowValues::Int(1)]
        );
    }

    #[test]
    fn colliding_sanitized_columns_get_distinct_placeholders() {
        let db = Database::sqlite(":memory:");
        let data = cols(&[("a-b", 1.into()), ("a_b", 2.into())]);
        let stmt = db.table("t").compile_insert(&data, SQLITE).unwrap();
        assert_eq!(stmt.query, "INSERT INTO t (a-b, a_b) VALUES (?1, ?2)");
        assert_eq!(stmt.params, vec![RowValues::Int(1), RowValues::Int(2)]);
    }
}
