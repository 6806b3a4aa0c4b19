//! Page requests, pages, and sort-column resolution.

use crate::error::AppError;
use crate::sql::{Direction, Sort, Table};
use std::collections::HashMap;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageRequest {
    /// Zero-based page index.
    pub index: u32,
    pub size: u32,
    /// Requested sorts keyed by column name.
    pub sorts: HashMap<String, Direction>,
}

impl PageRequest {
    pub const DEFAULT_SIZE: u32 = 20;
    pub const MAX_SIZE: u32 = 1000;

    pub fn new(index: u32, size: u32) -> Result<Self, AppError> {
        if size == 0 || size > Self::MAX_SIZE {
            return Err(AppError::InvalidPageRequest(format!(
                "size must be between 1 and {}",
                Self::MAX_SIZE
            )));
        }
        Ok(PageRequest {
            index,
            size,
            sorts: HashMap::new(),
        })
    }

    pub fn with_sort(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.sorts.insert(column.into(), direction);
        self
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.index) * u64::from(self.size)
    }

    /// Walk the table's sortable columns in declaration order and take the first one requested.
    /// At most one column is honored; request order does not matter.
    pub fn resolve_sort(&self, table: &Table) -> Option<Sort> {
        table
            .sortable_columns()
            .find(|c| self.sorts.contains_key(c.name))
            .map(|c| Sort {
                column: c.name,
                direction: self.sorts.get(c.name).copied().unwrap_or(Direction::Asc),
            })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_items: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total_items: u64, size: u32) -> Self {
        Page {
            items,
            total_items,
            total_pages: total_pages(total_items, size),
        }
    }

    pub fn try_map<U, F>(self, f: F) -> Result<Page<U>, AppError>
    where
        F: FnMut(T) -> Result<U, AppError>,
    {
        Ok(Page {
            items: self.items.into_iter().map(f).collect::<Result<_, _>>()?,
            total_items: self.total_items,
            total_pages: self.total_pages,
        })
    }

    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total_items: self.total_items,
            total_pages: self.total_pages,
        }
    }
}

/// ceiling(total_items / size); zero for an empty size.
pub fn total_pages(total_items: u64, size: u32) -> u64 {
    if size == 0 {
        return 0;
    }
    total_items.div_ceil(u64::from(size))
}
