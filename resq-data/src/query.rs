use std::convert::Infallible;

use crate::error::QueryError;
use crate::page::PageRequest;
use crate::target::{Comparison, Direction, QueryTarget};
use crate::value::FilterValue;

/// A SQL `SELECT` builder usable as a [`QueryTarget`].
///
/// # Example
///
/// ```ignore
/// let q = QueryBuilder::new("users")
///     .where_eq("state", "active")
///     .where_like("name", "%alice%")
///     .order_by("created_at", Direction::Desc)
///     .limit(10);
/// let (sql, params) = q.build_select("*");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Generic SQL using `?` placeholders (default).
    Generic,
    /// SQLite-style `?` placeholders.
    Sqlite,
    /// MySQL-style `?` placeholders with backtick quoting.
    MySql,
    /// Postgres-style `$1, $2, ...` placeholders.
    Postgres,
}

impl Dialect {
    fn placeholder(self, index: usize) -> String {
        match self {
            Dialect::Postgres => format!("${index}"),
            Dialect::Generic | Dialect::Sqlite | Dialect::MySql => "?".to_string(),
        }
    }

    fn quote_char(self) -> char {
        match self {
            Dialect::MySql => '`',
            Dialect::Generic | Dialect::Sqlite | Dialect::Postgres => '"',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierPolicy {
    /// Do not validate or quote identifiers.
    Raw,
    /// Validate identifiers against a conservative pattern.
    Validate,
    /// Validate and quote identifiers using the dialect quoting style.
    Quote,
}

#[derive(Debug, Clone)]
pub struct QueryBuilder {
    table: String,
    conditions: Vec<Condition>,
    order: Vec<(String, Direction)>,
    limit_val: Option<u64>,
    offset_val: Option<u64>,
    dialect: Dialect,
    identifier_policy: IdentifierPolicy,
}

#[derive(Debug, Clone, PartialEq)]
enum Condition {
    Compare(String, Comparison, FilterValue),
    In(String, Vec<FilterValue>),
    IsNull(String),
    IsNotNull(String),
}

impl QueryBuilder {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            conditions: Vec::new(),
            order: Vec::new(),
            limit_val: None,
            offset_val: None,
            dialect: Dialect::Generic,
            identifier_policy: IdentifierPolicy::Raw,
        }
    }

    pub fn new_with_dialect(table: &str, dialect: Dialect) -> Self {
        Self::new(table).dialect(dialect)
    }

    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn identifier_policy(mut self, policy: IdentifierPolicy) -> Self {
        self.identifier_policy = policy;
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn where_eq(self, column: &str, value: impl Into<FilterValue>) -> Self {
        self.compare(column, Comparison::Eq, value)
    }

    pub fn where_not_eq(self, column: &str, value: impl Into<FilterValue>) -> Self {
        self.compare(column, Comparison::NotEq, value)
    }

    pub fn where_like(self, column: &str, pattern: &str) -> Self {
        self.compare(column, Comparison::Like, pattern)
    }

    pub fn compare(mut self, column: &str, op: Comparison, value: impl Into<FilterValue>) -> Self {
        self.conditions
            .push(Condition::Compare(column.to_string(), op, value.into()));
        self
    }

    pub fn where_in_values<V: Into<FilterValue>>(
        mut self,
        column: &str,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.conditions.push(Condition::In(
            column.to_string(),
            values.into_iter().map(Into::into).collect(),
        ));
        self
    }

    pub fn where_null(mut self, column: &str) -> Self {
        self.conditions.push(Condition::IsNull(column.to_string()));
        self
    }

    pub fn where_not_null(mut self, column: &str) -> Self {
        self.conditions.push(Condition::IsNotNull(column.to_string()));
        self
    }

    pub fn order_by(mut self, column: &str, direction: Direction) -> Self {
        self.order.push((column.to_string(), direction));
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit_val = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset_val = Some(offset);
        self
    }

    /// Number of predicates added so far.
    pub fn condition_count(&self) -> usize {
        self.conditions.len()
    }

    /// Ordering clauses in application order.
    pub fn ordering(&self) -> &[(String, Direction)] {
        &self.order
    }

    pub fn limit_offset(&self) -> (Option<u64>, Option<u64>) {
        (self.limit_val, self.offset_val)
    }

    /// Drop ordering and paging, keeping only the predicates. Used for COUNT queries.
    pub fn without_paging(&self) -> Self {
        Self {
            order: Vec::new(),
            limit_val: None,
            offset_val: None,
            ..self.clone()
        }
    }

    /// Build a SELECT query returning `(sql, bind_values)`.
    ///
    /// The `columns` parameter is inserted verbatim (e.g., `"*"` or `"id, name"`).
    pub fn build_select(&self, columns: &str) -> (String, Vec<FilterValue>) {
        let raw = |ident: &str, _: bool, _: &'static str| Ok::<_, Infallible>(ident.to_string());
        match self.render(&format!("SELECT {columns} FROM {}", self.table), true, raw) {
            Ok(out) => out,
            Err(never) => match never {},
        }
    }

    /// Build a SELECT query with validated identifiers.
    ///
    /// Rejects invalid identifiers and optionally quotes them (depending on
    /// `identifier_policy`). Use it when identifiers may come from rule
    /// declarations you do not fully control.
    pub fn build_select_checked(
        &self,
        columns: &[&str],
    ) -> Result<(String, Vec<FilterValue>), QueryError> {
        let table = self.checked_identifier(&self.table, false, "table")?;
        let columns = columns
            .iter()
            .map(|c| self.checked_identifier(c, true, "column"))
            .collect::<Result<Vec<_>, _>>()?
            .join(", ");
        self.render(&format!("SELECT {columns} FROM {table}"), true, |ident, star, kind| {
            self.checked_identifier(ident, star, kind)
        })
    }

    /// Build a COUNT query over the same predicates (no ordering or paging).
    pub fn build_count(&self) -> (String, Vec<FilterValue>) {
        let raw = |ident: &str, _: bool, _: &'static str| Ok::<_, Infallible>(ident.to_string());
        match self.render(&format!("SELECT COUNT(*) FROM {}", self.table), false, raw) {
            Ok(out) => out,
            Err(never) => match never {},
        }
    }

    pub fn build_count_checked(&self) -> Result<(String, Vec<FilterValue>), QueryError> {
        let table = self.checked_identifier(&self.table, false, "table")?;
        self.render(&format!("SELECT COUNT(*) FROM {table}"), false, |ident, star, kind| {
            self.checked_identifier(ident, star, kind)
        })
    }

    fn render<E>(
        &self,
        head: &str,
        with_order_and_paging: bool,
        ident: impl Fn(&str, bool, &'static str) -> Result<String, E>,
    ) -> Result<(String, Vec<FilterValue>), E> {
        let mut sql = head.to_string();
        let mut params = Vec::new();

        if !self.conditions.is_empty() {
            let mut clauses = Vec::with_capacity(self.conditions.len());
            for cond in &self.conditions {
                let clause = match cond {
                    Condition::Compare(col, op, val) => {
                        let col = ident(col, false, "column")?;
                        params.push(val.clone());
                        let placeholder = self.dialect.placeholder(params.len());
                        format!("{col} {} {placeholder}", op.sql_operator())
                    }
                    // `IN ()` is not valid SQL; an empty set matches nothing.
                    Condition::In(_, vals) if vals.is_empty() => "1 = 0".to_string(),
                    Condition::In(col, vals) => {
                        let col = ident(col, false, "column")?;
                        let placeholders: Vec<_> = vals
                            .iter()
                            .map(|v| {
                                params.push(v.clone());
                                self.dialect.placeholder(params.len())
                            })
                            .collect();
                        format!("{col} IN ({})", placeholders.join(", "))
                    }
                    Condition::IsNull(col) => format!("{} IS NULL", ident(col, false, "column")?),
                    Condition::IsNotNull(col) => {
                        format!("{} IS NOT NULL", ident(col, false, "column")?)
                    }
                };
                clauses.push(clause);
            }
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }

        if !with_order_and_paging {
            return Ok((sql, params));
        }

        if !self.order.is_empty() {
            let mut clauses = Vec::with_capacity(self.order.len());
            for (col, dir) in &self.order {
                let col = ident(col, false, "column")?;
                clauses.push(match dir {
                    Direction::Asc => format!("{col} ASC"),
                    Direction::Desc => format!("{col} DESC"),
                });
            }
            sql.push_str(" ORDER BY ");
            sql.push_str(&clauses.join(", "));
        }
        if let Some(limit) = self.limit_val {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = self.offset_val {
            sql.push_str(&format!(" OFFSET {offset}"));
        }
        Ok((sql, params))
    }

    fn checked_identifier(
        &self,
        ident: &str,
        allow_star: bool,
        kind: &'static str,
    ) -> Result<String, QueryError> {
        if !is_valid_identifier(ident, allow_star) {
            return Err(QueryError::InvalidIdentifier {
                kind,
                ident: ident.to_string(),
            });
        }
        match self.identifier_policy {
            IdentifierPolicy::Quote => Ok(quote_identifier(ident, self.dialect.quote_char())),
            IdentifierPolicy::Raw | IdentifierPolicy::Validate => Ok(ident.to_string()),
        }
    }
}

impl QueryTarget for QueryBuilder {
    fn where_cmp(&mut self, field: &str, op: Comparison, value: &FilterValue) {
        self.conditions
            .push(Condition::Compare(field.to_string(), op, value.clone()));
    }

    fn where_in(&mut self, field: &str, values: &[FilterValue]) {
        self.conditions
            .push(Condition::In(field.to_string(), values.to_vec()));
    }

    fn order_by(&mut self, field: &str, direction: Direction) {
        self.order.push((field.to_string(), direction));
    }

    fn paginate(&mut self, page: &PageRequest) {
        self.limit_val = Some(page.limit());
        self.offset_val = Some(page.offset());
    }
}

fn is_valid_identifier(ident: &str, allow_star: bool) -> bool {
    let parts: Vec<&str> = ident.split('.').collect();
    let last = parts.len() - 1;
    !ident.is_empty()
        && parts.iter().enumerate().all(|(idx, part)| {
            (allow_star && idx == last && *part == "*") || is_valid_segment(part)
        })
}

fn is_valid_segment(segment: &str) -> bool {
    let mut chars = segment.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn quote_identifier(ident: &str, quote: char) -> String {
    ident
        .split('.')
        .map(|part| {
            if part == "*" {
                part.to_string()
            } else {
                format!("{quote}{part}{quote}")
            }
        })
        .collect::<Vec<_>>()
        .join(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_select() {
        let (sql, params) = QueryBuilder::new("users").build_select("*");
        assert_eq!(sql, "SELECT * FROM users");
        assert!(params.is_empty());
    }

    #[test]
    fn test_complex_query() {
        let (sql, params) = QueryBuilder::new("users")
            .where_eq("status", "active")
            .where_like("name", "%alice%")
            .order_by("id", Direction::Asc)
            .limit(10)
            .offset(20)
            .build_select("id, name");
        assert_eq!(
            sql,
            "SELECT id, name FROM users WHERE status = ? AND name LIKE ? ORDER BY id ASC LIMIT 10 OFFSET 20"
        );
        assert_eq!(params, vec![FilterValue::from("active"), FilterValue::from("%alice%")]);
    }

    #[test]
    fn test_count_ignores_order_and_paging() {
        let (sql, params) = QueryBuilder::new("users")
            .where_eq("active", 1)
            .order_by("id", Direction::Desc)
            .limit(5)
            .build_count();
        assert_eq!(sql, "SELECT COUNT(*) FROM users WHERE active = ?");
        assert_eq!(params, vec![FilterValue::Int(1)]);
    }

    #[test]
    fn test_postgres_placeholders() {
        let (sql, params) = QueryBuilder::new_with_dialect("users", Dialect::Postgres)
            .where_eq("status", "active")
            .where_in_values("role", ["admin", "user"])
            .compare("age", Comparison::Gte, 18)
            .build_select("*");
        assert_eq!(
            sql,
            "SELECT * FROM users WHERE status = $1 AND role IN ($2, $3) AND age >= $4"
        );
        assert_eq!(params.len(), 4);
    }

    #[test]
    fn test_empty_in_matches_nothing() {
        let (sql, params) = QueryBuilder::new("users")
            .where_in_values("id", Vec::<i64>::new())
            .build_select("*");
        assert_eq!(sql, "SELECT * FROM users WHERE 1 = 0");
        assert!(params.is_empty());
    }

    #[test]
    fn test_checked_identifiers_and_quoting() {
        let (sql, _) = QueryBuilder::new("users")
            .dialect(Dialect::Postgres)
            .identifier_policy(IdentifierPolicy::Quote)
            .where_eq("users.email", "a@b.com")
            .order_by("users.id", Direction::Desc)
            .build_select_checked(&["users.id", "users.*"])
            .unwrap();
        assert_eq!(
            sql,
            "SELECT \"users\".\"id\", \"users\".* FROM \"users\" WHERE \"users\".\"email\" = $1 ORDER BY \"users\".\"id\" DESC"
        );
    }

    #[test]
    fn test_checked_rejects_injected_column() {
        let mut q = QueryBuilder::new("users").identifier_policy(IdentifierPolicy::Validate);
        QueryTarget::order_by(&mut q, "id; DROP TABLE users", Direction::Asc);
        let err = q.build_select_checked(&["*"]).unwrap_err();
        assert!(matches!(err, QueryError::InvalidIdentifier { kind: "column", .. }));
    }

    #[test]
    fn test_paginate_sets_limit_and_offset() {
        let mut q = QueryBuilder::new("users");
        q.paginate(&PageRequest::new(3, 25));
        assert_eq!(q.limit_offset(), (Some(25), Some(50)));
    }
}
