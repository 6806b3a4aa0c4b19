//! In-memory repository. Evaluates the same criteria, sort resolution and unique columns as the
//! SQL side, so services and routes can run without a database (tests, local demos).
//! Foreign key cascades are not emulated.

use super::page::{Page, PageRequest};
use super::repository::ResourceRepository;
use super::ResourceRow;
use crate::error::AppError;
use crate::sql::{compare_rows, Criteria, Direction, Sort, SqlValue};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

pub struct InMemoryRepository<R> {
    rows: RwLock<Vec<R>>,
}

impl<R: ResourceRow> Default for InMemoryRepository<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: ResourceRow> InMemoryRepository<R> {
    pub fn new() -> Self {
        InMemoryRepository {
            rows: RwLock::new(Vec::new()),
        }
    }

    pub fn with_rows(rows: Vec<R>) -> Self {
        InMemoryRepository {
            rows: RwLock::new(rows),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Vec<R>>, AppError> {
        self.rows
            .read()
            .map_err(|_| AppError::Internal("repository lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<R>>, AppError> {
        self.rows
            .write()
            .map_err(|_| AppError::Internal("repository lock poisoned".into()))
    }

    fn select(&self, criteria: &Criteria, order: Option<&Sort>) -> Result<Vec<R>, AppError> {
        let table = R::TABLE;
        let mut out: Vec<R> = self
            .read()?
            .iter()
            .filter(|r| criteria.matches(table, &r.values()))
            .cloned()
            .collect();
        let by_id = Sort {
            column: table.id_column,
            direction: Direction::Asc,
        };
        let sort = order.unwrap_or(&by_id);
        out.sort_by(|a, b| compare_rows(table, sort, &a.values(), &b.values()));
        Ok(out)
    }
}

fn same_unique_value(a: &SqlValue, b: &SqlValue) -> bool {
    match (a, b) {
        (SqlValue::Null, _) | (_, SqlValue::Null) => false,
        (SqlValue::Text(x), _) => b.eq_ignore_case(x),
        _ => a == b,
    }
}

/// Fails with `AlreadyExists` when another row holds the same value in a unique column.
fn check_unique<R: ResourceRow>(rows: &[R], row: &R) -> Result<(), AppError> {
    let table = R::TABLE;
    let values = row.values();
    for (i, column) in table.columns.iter().enumerate() {
        if !column.unique || column.name == table.id_column {
            continue;
        }
        let Some(value) = values.get(i) else { continue };
        let taken = rows
            .iter()
            .filter(|r| r.id() != row.id())
            .any(|r| r.values().get(i).is_some_and(|v| same_unique_value(v, value)));
        if taken {
            return Err(AppError::AlreadyExists(format!(
                "unique constraint {}_{}_key",
                table.name, column.name
            )));
        }
    }
    Ok(())
}

fn upsert<R: ResourceRow>(rows: &mut Vec<R>, row: R) -> Result<(), AppError> {
    check_unique(rows, &row)?;
    match rows.iter_mut().find(|r| r.id() == row.id()) {
        Some(existing) => *existing = row,
        None => rows.push(row),
    }
    Ok(())
}

#[async_trait]
impl<R: ResourceRow> ResourceRepository<R> for InMemoryRepository<R> {
    async fn save(&self, row: R) -> Result<R, AppError> {
        let mut rows = self.write()?;
        upsert(&mut rows, row.clone())?;
        Ok(row)
    }

    /// All or nothing, like the single transaction on the SQL side.
    async fn save_all(&self, rows: Vec<R>) -> Result<Vec<R>, AppError> {
        let mut stored = self.write()?;
        let mut staged = stored.clone();
        for row in &rows {
            upsert(&mut staged, row.clone())?;
        }
        *stored = staged;
        Ok(rows)
    }

    async fn find_one(&self, id: &str) -> Result<Option<R>, AppError> {
        Ok(self.read()?.iter().find(|r| r.id() == id).cloned())
    }

    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<R>, AppError> {
        let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let mut out: Vec<R> = self
            .read()?
            .iter()
            .filter(|r| wanted.contains(r.id()))
            .cloned()
            .collect();
        out.sort_by(|a, b| a.id().cmp(b.id()));
        Ok(out)
    }

    async fn find_all(&self, criteria: &Criteria) -> Result<Vec<R>, AppError> {
        self.select(criteria, criteria.order.as_ref())
    }

    async fn find_page(&self, criteria: &Criteria, request: &PageRequest) -> Result<Page<R>, AppError> {
        let sort = request.resolve_sort(R::TABLE);
        let all = self.select(criteria, sort.as_ref())?;
        let total = all.len() as u64;
        let offset = usize::try_from(request.offset()).unwrap_or(usize::MAX);
        let items = all.into_iter().skip(offset).take(request.size as usize).collect();
        Ok(Page::new(items, total, request.size))
    }

    async fn exists(&self, id: &str) -> Result<bool, AppError> {
        Ok(self.read()?.iter().any(|r| r.id() == id))
    }

    async fn count(&self, criteria: &Criteria) -> Result<u64, AppError> {
        let table = R::TABLE;
        Ok(self
            .read()?
            .iter()
            .filter(|r| criteria.matches(table, &r.values()))
            .count() as u64)
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        let mut rows = self.write()?;
        let before = rows.len();
        rows.retain(|r| r.id() != id);
        Ok(rows.len() < before)
    }

    async fn delete_by_ids(&self, ids: &[String]) -> Result<bool, AppError> {
        let mut rows = self.write()?;
        let before = rows.len();
        rows.retain(|r| !ids.iter().any(|id| id == r.id()));
        Ok(before - rows.len() == ids.len())
    }

    async fn delete_where(&self, criteria: &Criteria) -> Result<u64, AppError> {
        let table = R::TABLE;
        let mut rows = self.write()?;
        let before = rows.len();
        rows.retain(|r| !criteria.matches(table, &r.values()));
        Ok((before - rows.len()) as u64)
    }
}
