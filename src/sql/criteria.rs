//! Typed predicates and ordering over a table's columns.
//!
//! The same `Criteria` renders to a WHERE/ORDER BY clause in the builder and is
//! evaluated directly against row values by the in-memory repository.

use super::params::SqlValue;
use super::table::Table;
use std::cmp::Ordering;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(Direction::Asc),
            "desc" => Ok(Direction::Desc),
            other => Err(format!("unknown direction '{}'", other)),
        }
    }
}

impl Direction {
    pub fn keyword(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sort {
    pub column: &'static str,
    pub direction: Direction,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Predicate {
    Eq(SqlValue),
    EqIgnoreCase(String),
    In(Vec<SqlValue>),
    /// Inclusive on both bounds.
    Between(SqlValue, SqlValue),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Condition {
    pub column: &'static str,
    pub predicate: Predicate,
}

/// Conjunction of conditions plus an optional single ordering column.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Criteria {
    pub conditions: Vec<Condition>,
    pub order: Option<Sort>,
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: &'static str, value: impl Into<SqlValue>) -> Self {
        self.conditions.push(Condition {
            column,
            predicate: Predicate::Eq(value.into()),
        });
        self
    }

    pub fn eq_ignore_case(mut self, column: &'static str, value: &str) -> Self {
        self.conditions.push(Condition {
            column,
            predicate: Predicate::EqIgnoreCase(value.to_string()),
        });
        self
    }

    pub fn is_in<V: Into<SqlValue>>(mut self, column: &'static str, values: impl IntoIterator<Item = V>) -> Self {
        self.conditions.push(Condition {
            column,
            predicate: Predicate::In(values.into_iter().map(Into::into).collect()),
        });
        self
    }

    pub fn between(mut self, column: &'static str, from: impl Into<SqlValue>, to: impl Into<SqlValue>) -> Self {
        self.conditions.push(Condition {
            column,
            predicate: Predicate::Between(from.into(), to.into()),
        });
        self
    }

    pub fn order_by(mut self, column: &'static str, direction: Direction) -> Self {
        self.order = Some(Sort { column, direction });
        self
    }

    /// Evaluate against row values laid out in `table` column order.
    /// Conditions on columns the table does not declare are ignored, as in SQL rendering.
    pub fn matches(&self, table: &Table, values: &[SqlValue]) -> bool {
        self.conditions.iter().all(|c| {
            let Some(v) = table.column_index(c.column).and_then(|i| values.get(i)) else {
                return true;
            };
            match &c.predicate {
                Predicate::Eq(SqlValue::Null) => *v == SqlValue::Null,
                Predicate::Eq(expected) => v == expected,
                Predicate::EqIgnoreCase(expected) => v.eq_ignore_case(expected),
                Predicate::In(candidates) => candidates.iter().any(|cand| cand == v),
                Predicate::Between(from, to) => {
                    *v != SqlValue::Null
                        && v.compare(from) != Ordering::Less
                        && v.compare(to) != Ordering::Greater
                }
            }
        })
    }
}

/// Compare two rows on one sort column.
pub fn compare_rows(table: &Table, sort: &Sort, a: &[SqlValue], b: &[SqlValue]) -> Ordering {
    let Some(i) = table.column_index(sort.column) else {
        return Ordering::Equal;
    };
    let ord = match (a.get(i), b.get(i)) {
        (Some(x), Some(y)) => x.compare(y),
        _ => Ordering::Equal,
    };
    match sort.direction {
        Direction::Asc => ord,
        Direction::Desc => ord.reverse(),
    }
}
