//! Generic resources: domain/row conversion, paging, repositories and the CRUD service.

mod memory;
mod page;
mod repository;
mod service;

pub use memory::InMemoryRepository;
pub use page::{total_pages, Page, PageRequest};
pub use repository::{PgResourceRepository, ResourceRepository};
pub use service::{PagingService, ResourceService};

use crate::error::AppError;
use crate::sql::{SqlValue, Table};
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use std::fmt::Debug;

/// A domain entity persisted in the relational store.
pub trait PersistentResource: Clone + Debug + Send + Sync + 'static {
    fn id(&self) -> &str;
    fn creation_date(&self) -> DateTime<Utc>;
}

/// Table-mapped counterpart of a resource. `values` follow `TABLE.columns` order.
pub trait ResourceRow:
    Clone + Debug + Send + Sync + Unpin + for<'r> sqlx::FromRow<'r, PgRow> + 'static
{
    const TABLE: &'static Table;

    fn id(&self) -> &str;

    fn values(&self) -> Vec<SqlValue>;
}

/// Row ⇄ domain conversion. The pair must round-trip every field.
pub trait Conversion: Send + Sync + 'static {
    type Resource: PersistentResource;
    type Row: ResourceRow;

    fn instantiate(&self, row: Self::Row) -> Result<Self::Resource, AppError>;

    fn map(&self, resource: &Self::Resource) -> Self::Row;

    fn instantiate_opt(&self, row: Option<Self::Row>) -> Result<Option<Self::Resource>, AppError> {
        row.map(|r| self.instantiate(r)).transpose()
    }

    fn map_opt(&self, resource: Option<&Self::Resource>) -> Option<Self::Row> {
        resource.map(|r| self.map(r))
    }
}

/// Random resource id.
pub fn random_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
