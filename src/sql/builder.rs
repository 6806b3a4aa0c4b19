//! Builds parameterized SELECT, INSERT, UPDATE, DELETE from a table descriptor.

use super::criteria::{Criteria, Predicate, Sort};
use super::params::SqlValue;
use super::table::{Column, Table};

/// Quote identifier for PostgreSQL (safe: only from descriptors and config).
pub(crate) fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Full qualified table name.
pub(crate) fn qualified_table(schema: &str, table: &str) -> String {
    format!("{}.{}", quoted(schema), quoted(table))
}

#[derive(Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: SqlValue) -> u32 {
        let n = self.params.len() as u32 + 1;
        self.params.push(v);
        n
    }

    /// Push a value and return its placeholder cast to the column type.
    fn placeholder(&mut self, column: &Column, v: SqlValue) -> String {
        let n = self.push_param(v);
        format!("${}::{}", n, column.sql_type.pg_name())
    }
}

fn select_column_list(table: &Table) -> String {
    table
        .columns
        .iter()
        .map(|c| quoted(c.name))
        .collect::<Vec<_>>()
        .join(", ")
}

fn id_column(table: &Table) -> &Column {
    table
        .column(table.id_column)
        .unwrap_or(&table.columns[0])
}

fn id_in_clause(q: &mut QueryBuf, table: &Table, ids: &[String]) -> String {
    if ids.is_empty() {
        return "1 = 0".to_string();
    }
    let col = id_column(table);
    let placeholders: Vec<String> = ids
        .iter()
        .map(|id| q.placeholder(col, SqlValue::Text(id.clone())))
        .collect();
    format!("{} IN ({})", quoted(col.name), placeholders.join(", "))
}

/// WHERE clause for criteria; conditions on undeclared columns are skipped.
fn where_clause(q: &mut QueryBuf, table: &Table, criteria: &Criteria) -> String {
    let mut parts = Vec::new();
    for cond in &criteria.conditions {
        let Some(col) = table.column(cond.column) else {
            tracing::warn!(table = table.name, column = cond.column, "condition on unknown column ignored");
            continue;
        };
        let name = quoted(col.name);
        let part = match &cond.predicate {
            Predicate::Eq(SqlValue::Null) => format!("{} IS NULL", name),
            Predicate::Eq(v) => format!("{} = {}", name, q.placeholder(col, v.clone())),
            Predicate::EqIgnoreCase(s) => {
                let n = q.push_param(SqlValue::Text(s.clone()));
                format!("LOWER({}) = LOWER(${}::text)", name, n)
            }
            Predicate::In(values) if values.is_empty() => "1 = 0".to_string(),
            Predicate::In(values) => {
                let phs: Vec<String> = values.iter().map(|v| q.placeholder(col, v.clone())).collect();
                format!("{} IN ({})", name, phs.join(", "))
            }
            Predicate::Between(from, to) => {
                let a = q.placeholder(col, from.clone());
                let b = q.placeholder(col, to.clone());
                format!("{} BETWEEN {} AND {}", name, a, b)
            }
        };
        parts.push(part);
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", parts.join(" AND "))
    }
}

/// ORDER BY the given sort, or the id column when none.
fn order_clause(table: &Table, order: Option<&Sort>) -> String {
    match order {
        Some(sort) if table.column(sort.column).is_some() => {
            format!(" ORDER BY {} {}", quoted(sort.column), sort.direction.keyword())
        }
        _ => format!(" ORDER BY {}", quoted(table.id_column)),
    }
}

/// SELECT by id. Id is the sole param.
pub fn select_by_id(schema: &str, table: &Table, id: &str) -> QueryBuf {
    let mut q = QueryBuf::new();
    let col = id_column(table);
    let ph = q.placeholder(col, SqlValue::Text(id.to_string()));
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} = {}",
        select_column_list(table),
        qualified_table(schema, table.name),
        quoted(col.name),
        ph
    );
    q
}

/// SELECT rows whose id is in `ids`, ordered by id.
pub fn select_by_ids(schema: &str, table: &Table, ids: &[String]) -> QueryBuf {
    let mut q = QueryBuf::new();
    let clause = id_in_clause(&mut q, table, ids);
    q.sql = format!(
        "SELECT {} FROM {} WHERE {}{}",
        select_column_list(table),
        qualified_table(schema, table.name),
        clause,
        order_clause(table, None)
    );
    q
}

/// SELECT only the ids among `ids` that are stored. Used to split a batch save.
pub fn select_existing_ids(schema: &str, table: &Table, ids: &[String]) -> QueryBuf {
    let mut q = QueryBuf::new();
    let clause = id_in_clause(&mut q, table, ids);
    q.sql = format!(
        "SELECT {} FROM {} WHERE {}",
        quoted(table.id_column),
        qualified_table(schema, table.name),
        clause
    );
    q
}

pub fn exists_by_id(schema: &str, table: &Table, id: &str) -> QueryBuf {
    let mut q = QueryBuf::new();
    let col = id_column(table);
    let ph = q.placeholder(col, SqlValue::Text(id.to_string()));
    q.sql = format!(
        "SELECT EXISTS(SELECT 1 FROM {} WHERE {} = {})",
        qualified_table(schema, table.name),
        quoted(col.name),
        ph
    );
    q
}

/// SELECT with criteria. Ordered by the criteria's sort, else by id.
pub fn select_where(schema: &str, table: &Table, criteria: &Criteria) -> QueryBuf {
    let mut q = QueryBuf::new();
    let clause = where_clause(&mut q, table, criteria);
    q.sql = format!(
        "SELECT {} FROM {}{}{}",
        select_column_list(table),
        qualified_table(schema, table.name),
        clause,
        order_clause(table, criteria.order.as_ref())
    );
    q
}

/// One page: criteria, a single ORDER BY column, LIMIT/OFFSET.
pub fn select_page(
    schema: &str,
    table: &Table,
    criteria: &Criteria,
    order: Option<&Sort>,
    limit: u32,
    offset: u64,
) -> QueryBuf {
    let mut q = QueryBuf::new();
    let clause = where_clause(&mut q, table, criteria);
    q.sql = format!(
        "SELECT {} FROM {}{}{} LIMIT {} OFFSET {}",
        select_column_list(table),
        qualified_table(schema, table.name),
        clause,
        order_clause(table, order),
        limit,
        offset
    );
    q
}

pub fn count_where(schema: &str, table: &Table, criteria: &Criteria) -> QueryBuf {
    let mut q = QueryBuf::new();
    let clause = where_clause(&mut q, table, criteria);
    q.sql = format!(
        "SELECT COUNT(*) FROM {}{}",
        qualified_table(schema, table.name),
        clause
    );
    q
}

/// INSERT one row; `values` are in table column order.
pub fn insert(schema: &str, table: &Table, values: &[SqlValue]) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for (c, v) in table.columns.iter().zip(values) {
        cols.push(quoted(c.name));
        placeholders.push(q.placeholder(c, v.clone()));
    }
    q.sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        qualified_table(schema, table.name),
        cols.join(", "),
        placeholders.join(", ")
    );
    q
}

/// UPDATE by id: every non-id column is set from `values` (table column order).
pub fn update_by_id(schema: &str, table: &Table, values: &[SqlValue]) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut sets = Vec::new();
    let mut id_value = SqlValue::Null;
    for (c, v) in table.columns.iter().zip(values) {
        if c.name == table.id_column {
            id_value = v.clone();
            continue;
        }
        let ph = q.placeholder(c, v.clone());
        sets.push(format!("{} = {}", quoted(c.name), ph));
    }
    let id_ph = q.placeholder(id_column(table), id_value);
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = {}",
        qualified_table(schema, table.name),
        sets.join(", "),
        quoted(table.id_column),
        id_ph
    );
    q
}

/// PostgreSQL's bind parameter limit per statement.
pub const MAX_PARAMS: usize = 65_535;

/// How many rows of `table` fit in one multi-row statement.
pub fn rows_per_statement(table: &Table) -> usize {
    (MAX_PARAMS / table.columns.len().max(1)).max(1)
}

fn values_tuples(q: &mut QueryBuf, table: &Table, rows: &[Vec<SqlValue>]) -> String {
    rows.iter()
        .map(|values| {
            let phs: Vec<String> = table
                .columns
                .iter()
                .zip(values)
                .map(|(c, v)| q.placeholder(c, v.clone()))
                .collect();
            format!("({})", phs.join(", "))
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// INSERT many rows in one statement; each row's values are in table column order.
pub fn insert_many(schema: &str, table: &Table, rows: &[Vec<SqlValue>]) -> QueryBuf {
    let mut q = QueryBuf::new();
    let tuples = values_tuples(&mut q, table, rows);
    q.sql = format!(
        "INSERT INTO {} ({}) VALUES {}",
        qualified_table(schema, table.name),
        select_column_list(table),
        tuples
    );
    q
}

/// UPDATE many rows by id in one statement, joining on a VALUES list.
pub fn update_many(schema: &str, table: &Table, rows: &[Vec<SqlValue>]) -> QueryBuf {
    let mut q = QueryBuf::new();
    let tuples = values_tuples(&mut q, table, rows);
    let sets: Vec<String> = table
        .columns
        .iter()
        .filter(|c| c.name != table.id_column)
        .map(|c| format!("{} = v.{}", quoted(c.name), quoted(c.name)))
        .collect();
    q.sql = format!(
        "UPDATE {} AS t SET {} FROM (VALUES {}) AS v({}) WHERE t.{} = v.{}",
        qualified_table(schema, table.name),
        sets.join(", "),
        tuples,
        select_column_list(table),
        quoted(table.id_column),
        quoted(table.id_column)
    );
    q
}

pub fn delete_by_id(schema: &str, table: &Table, id: &str) -> QueryBuf {
    let mut q = QueryBuf::new();
    let col = id_column(table);
    let ph = q.placeholder(col, SqlValue::Text(id.to_string()));
    q.sql = format!(
        "DELETE FROM {} WHERE {} = {}",
        qualified_table(schema, table.name),
        quoted(col.name),
        ph
    );
    q
}

pub fn delete_by_ids(schema: &str, table: &Table, ids: &[String]) -> QueryBuf {
    let mut q = QueryBuf::new();
    let clause = id_in_clause(&mut q, table, ids);
    q.sql = format!("DELETE FROM {} WHERE {}", qualified_table(schema, table.name), clause);
    q
}

pub fn delete_where(schema: &str, table: &Table, criteria: &Criteria) -> QueryBuf {
    let mut q = QueryBuf::new();
    let clause = where_clause(&mut q, table, criteria);
    q.sql = format!("DELETE FROM {}{}", qualified_table(schema, table.name), clause);
    q
}
