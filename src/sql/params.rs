//! Bind values for PostgreSQL statements.

use chrono::{DateTime, Utc};
use sqlx::postgres::{PgArguments, Postgres};
use sqlx::query::Query;
use std::cmp::Ordering;

/// A value that can be bound to a PostgreSQL query. Row types produce one per column.
#[derive(Clone, Debug, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    I64(i64),
    Text(String),
    Timestamp(DateTime<Utc>),
}

impl SqlValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            SqlValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Total order used by in-memory evaluation. Nulls sort after every value, as PostgreSQL does for ASC.
    pub fn compare(&self, other: &SqlValue) -> Ordering {
        match (self, other) {
            (SqlValue::Null, SqlValue::Null) => Ordering::Equal,
            (SqlValue::Null, _) => Ordering::Greater,
            (_, SqlValue::Null) => Ordering::Less,
            (SqlValue::Bool(a), SqlValue::Bool(b)) => a.cmp(b),
            (SqlValue::I64(a), SqlValue::I64(b)) => a.cmp(b),
            (SqlValue::Text(a), SqlValue::Text(b)) => a.cmp(b),
            (SqlValue::Timestamp(a), SqlValue::Timestamp(b)) => a.cmp(b),
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }

    pub fn eq_ignore_case(&self, other: &str) -> bool {
        match self {
            SqlValue::Text(s) => s.to_lowercase() == other.to_lowercase(),
            _ => false,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            SqlValue::Bool(_) => 0,
            SqlValue::I64(_) => 1,
            SqlValue::Text(_) => 2,
            SqlValue::Timestamp(_) => 3,
            SqlValue::Null => 4,
        }
    }
}

impl From<String> for SqlValue {
    fn from(s: String) -> Self {
        SqlValue::Text(s)
    }
}

impl From<&str> for SqlValue {
    fn from(s: &str) -> Self {
        SqlValue::Text(s.to_string())
    }
}

impl From<bool> for SqlValue {
    fn from(b: bool) -> Self {
        SqlValue::Bool(b)
    }
}

impl From<i64> for SqlValue {
    fn from(n: i64) -> Self {
        SqlValue::I64(n)
    }
}

impl From<DateTime<Utc>> for SqlValue {
    fn from(d: DateTime<Utc>) -> Self {
        SqlValue::Timestamp(d)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(SqlValue::Null)
    }
}

/// Bind one value. Null is sent as untyped text; builder placeholders carry a cast to the column type.
pub fn bind_value<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: &SqlValue,
) -> Query<'q, Postgres, PgArguments> {
    match value {
        SqlValue::Null => query.bind(None::<String>),
        SqlValue::Bool(b) => query.bind(*b),
        SqlValue::I64(n) => query.bind(*n),
        SqlValue::Text(s) => query.bind(s.clone()),
        SqlValue::Timestamp(d) => query.bind(*d),
    }
}
