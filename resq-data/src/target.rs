use serde::{Deserialize, Serialize};

use crate::page::PageRequest;
use crate::value::FilterValue;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    /// Parse a direction, accepting only the exact strings `asc` and `desc`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "asc" => Some(Direction::Asc),
            "desc" => Some(Direction::Desc),
            _ => None,
        }
    }

    pub fn reversed(self) -> Self {
        match self {
            Direction::Asc => Direction::Desc,
            Direction::Desc => Direction::Asc,
        }
    }

    pub fn is_asc(self) -> bool {
        matches!(self, Direction::Asc)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Single-value comparison applied by a query target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    Eq,
    NotEq,
    Gte,
    Lte,
    /// Pattern match; the value already carries its `%` wildcards.
    Like,
}

impl Comparison {
    pub fn sql_operator(self) -> &'static str {
        match self {
            Comparison::Eq => "=",
            Comparison::NotEq => "!=",
            Comparison::Gte => ">=",
            Comparison::Lte => "<=",
            Comparison::Like => "LIKE",
        }
    }
}

/// The mutable query collaborator that filter and ordering rules write into.
///
/// Implement this for whatever builds queries in your application (a SQL
/// builder, a search request, an in-memory matcher). Mutations are applied in
/// rule declaration order and are never rolled back.
pub trait QueryTarget {
    /// Add a single comparison predicate (`field <op> value`).
    fn where_cmp(&mut self, field: &str, op: Comparison, value: &FilterValue);

    /// Add a set-membership predicate (`field IN (values…)`).
    fn where_in(&mut self, field: &str, values: &[FilterValue]);

    /// Append an ordering clause after any existing ones.
    fn order_by(&mut self, field: &str, direction: Direction);

    /// Restrict the query to one page.
    fn paginate(&mut self, page: &PageRequest);
}

impl<T: QueryTarget + ?Sized> QueryTarget for &mut T {
    fn where_cmp(&mut self, field: &str, op: Comparison, value: &FilterValue) {
        (**self).where_cmp(field, op, value)
    }

    fn where_in(&mut self, field: &str, values: &[FilterValue]) {
        (**self).where_in(field, values)
    }

    fn order_by(&mut self, field: &str, direction: Direction) {
        (**self).order_by(field, direction)
    }

    fn paginate(&mut self, page: &PageRequest) {
        (**self).paginate(page)
    }
}
