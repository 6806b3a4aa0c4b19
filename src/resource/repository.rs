//! Resource repository trait and its PostgreSQL implementation.

use super::page::{Page, PageRequest};
use super::ResourceRow;
use crate::error::AppError;
use crate::sql::{self, bind_value, Criteria, QueryBuf};
use async_trait::async_trait;
use sqlx::postgres::{PgArguments, PgConnection, Postgres};
use sqlx::query::Query;
use sqlx::{PgPool, Row};
use std::collections::HashSet;
use std::marker::PhantomData;

/// Row-level persistence for one table. Ids are the row's id column.
#[async_trait]
pub trait ResourceRepository<R: ResourceRow>: Send + Sync {
    /// Insert when the id is absent, update otherwise.
    async fn save(&self, row: R) -> Result<R, AppError>;

    /// One existence-set lookup, then an insert batch and an update batch.
    async fn save_all(&self, rows: Vec<R>) -> Result<Vec<R>, AppError>;

    async fn find_one(&self, id: &str) -> Result<Option<R>, AppError>;

    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<R>, AppError>;

    async fn find_all(&self, criteria: &Criteria) -> Result<Vec<R>, AppError>;

    async fn find_page(&self, criteria: &Criteria, request: &PageRequest) -> Result<Page<R>, AppError>;

    async fn exists(&self, id: &str) -> Result<bool, AppError>;

    async fn count(&self, criteria: &Criteria) -> Result<u64, AppError>;

    async fn delete(&self, id: &str) -> Result<bool, AppError>;

    /// True when every id was deleted.
    async fn delete_by_ids(&self, ids: &[String]) -> Result<bool, AppError>;

    async fn delete_where(&self, criteria: &Criteria) -> Result<u64, AppError>;

    async fn delete_all(&self) -> Result<bool, AppError> {
        Ok(self.delete_where(&Criteria::new()).await? > 0)
    }
}

/// PostgreSQL repository for row type `R` in `schema`.
pub struct PgResourceRepository<R> {
    pool: PgPool,
    schema: String,
    _row: PhantomData<fn() -> R>,
}

impl<R: ResourceRow> PgResourceRepository<R> {
    pub fn new(pool: PgPool, schema: impl Into<String>) -> Self {
        PgResourceRepository {
            pool,
            schema: schema.into(),
            _row: PhantomData,
        }
    }

    async fn fetch_rows(&self, q: &QueryBuf) -> Result<Vec<R>, AppError> {
        let rows = prepared(q).fetch_all(&self.pool).await?;
        rows.iter()
            .map(|r| R::from_row(r).map_err(AppError::from))
            .collect()
    }

    async fn existing_ids(&self, conn: &mut PgConnection, ids: &[String]) -> Result<HashSet<String>, AppError> {
        let mut existing = HashSet::new();
        for batch in ids.chunks(sql::MAX_PARAMS) {
            let q = sql::select_existing_ids(&self.schema, R::TABLE, batch);
            for row in prepared(&q).fetch_all(&mut *conn).await? {
                existing.insert(row.try_get::<String, _>(0)?);
            }
        }
        Ok(existing)
    }

    async fn execute(&self, q: &QueryBuf) -> Result<u64, AppError> {
        Ok(prepared(q).execute(&self.pool).await?.rows_affected())
    }
}

fn prepared(q: &QueryBuf) -> Query<'_, Postgres, PgArguments> {
    tracing::debug!(sql = %q.sql, params = ?q.params, "query");
    q.params.iter().fold(sqlx::query(&q.sql), bind_value)
}

#[async_trait]
impl<R: ResourceRow> ResourceRepository<R> for PgResourceRepository<R> {
    async fn save(&self, row: R) -> Result<R, AppError> {
        let values = row.values();
        let q = if self.exists(row.id()).await? {
            sql::update_by_id(&self.schema, R::TABLE, &values)
        } else {
            sql::insert(&self.schema, R::TABLE, &values)
        };
        self.execute(&q).await?;
        Ok(row)
    }

    async fn save_all(&self, rows: Vec<R>) -> Result<Vec<R>, AppError> {
        if rows.is_empty() {
            return Ok(rows);
        }
        let ids: Vec<String> = rows.iter().map(|r| r.id().to_string()).collect();
        let mut tx = self.pool.begin().await?;
        let persisted = self.existing_ids(&mut tx, &ids).await?;
        let (updates, inserts): (Vec<&R>, Vec<&R>) = rows.iter().partition(|r| persisted.contains(r.id()));

        let chunk = sql::rows_per_statement(R::TABLE);
        for batch in inserts.chunks(chunk) {
            let values: Vec<_> = batch.iter().map(|r| r.values()).collect();
            let q = sql::insert_many(&self.schema, R::TABLE, &values);
            prepared(&q).execute(&mut *tx).await?;
        }
        for batch in updates.chunks(chunk) {
            let values: Vec<_> = batch.iter().map(|r| r.values()).collect();
            let q = sql::update_many(&self.schema, R::TABLE, &values);
            prepared(&q).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        tracing::debug!(table = R::TABLE.name, inserted = inserts.len(), updated = updates.len(), "batch saved");
        Ok(rows)
    }

    async fn find_one(&self, id: &str) -> Result<Option<R>, AppError> {
        let q = sql::select_by_id(&self.schema, R::TABLE, id);
        Ok(self.fetch_rows(&q).await?.into_iter().next())
    }

    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<R>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let q = sql::select_by_ids(&self.schema, R::TABLE, ids);
        self.fetch_rows(&q).await
    }

    async fn find_all(&self, criteria: &Criteria) -> Result<Vec<R>, AppError> {
        let q = sql::select_where(&self.schema, R::TABLE, criteria);
        self.fetch_rows(&q).await
    }

    async fn find_page(&self, criteria: &Criteria, request: &PageRequest) -> Result<Page<R>, AppError> {
        let total = self.count(criteria).await?;
        let sort = request.resolve_sort(R::TABLE);
        let q = sql::select_page(
            &self.schema,
            R::TABLE,
            criteria,
            sort.as_ref(),
            request.size,
            request.offset(),
        );
        let items = self.fetch_rows(&q).await?;
        Ok(Page::new(items, total, request.size))
    }

    async fn exists(&self, id: &str) -> Result<bool, AppError> {
        let q = sql::exists_by_id(&self.schema, R::TABLE, id);
        let row = prepared(&q).fetch_one(&self.pool).await?;
        Ok(row.try_get::<bool, _>(0)?)
    }

    async fn count(&self, criteria: &Criteria) -> Result<u64, AppError> {
        let q = sql::count_where(&self.schema, R::TABLE, criteria);
        let row = prepared(&q).fetch_one(&self.pool).await?;
        let n: i64 = row.try_get(0)?;
        Ok(n.max(0) as u64)
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        let q = sql::delete_by_id(&self.schema, R::TABLE, id);
        Ok(self.execute(&q).await? == 1)
    }

    async fn delete_by_ids(&self, ids: &[String]) -> Result<bool, AppError> {
        let q = sql::delete_by_ids(&self.schema, R::TABLE, ids);
        Ok(self.execute(&q).await? == ids.len() as u64)
    }

    async fn delete_where(&self, criteria: &Criteria) -> Result<u64, AppError> {
        let q = sql::delete_where(&self.schema, R::TABLE, criteria);
        self.execute(&q).await
    }
}
