//! Generic CRUD and paging over a repository, in domain terms.

use super::page::{Page, PageRequest};
use super::repository::ResourceRepository;
use super::{Conversion, PersistentResource, ResourceRow};
use crate::error::AppError;
use crate::sql::Criteria;
use async_trait::async_trait;
use std::sync::Arc;

/// CRUD operations and pagination for a resource.
#[async_trait]
pub trait PagingService<E>: Send + Sync {
    /// Fails with `AlreadyExists` when the id is already stored.
    async fn create(&self, resource: E) -> Result<E, AppError>;

    async fn create_all(&self, resources: Vec<E>) -> Result<Vec<E>, AppError>;

    /// Fails with `NotFound` when the id is not stored.
    async fn update(&self, resource: E) -> Result<E, AppError>;

    async fn update_all(&self, resources: Vec<E>) -> Result<Vec<E>, AppError>;

    async fn find_one(&self, id: &str) -> Result<E, AppError>;

    async fn find_all(&self) -> Result<Vec<E>, AppError>;

    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<E>, AppError>;

    async fn find_page(&self, request: &PageRequest) -> Result<Page<E>, AppError>;

    async fn exists(&self, id: &str) -> Result<bool, AppError>;

    async fn count(&self) -> Result<u64, AppError>;

    /// Fails with `NotFound` when the id is not stored.
    async fn delete(&self, id: &str) -> Result<bool, AppError>;

    async fn delete_by_ids(&self, ids: &[String]) -> Result<bool, AppError>;

    async fn delete_all(&self) -> Result<bool, AppError>;
}

pub struct ResourceService<C: Conversion> {
    repository: Arc<dyn ResourceRepository<C::Row>>,
    conversion: C,
}

impl<C: Conversion> ResourceService<C> {
    pub fn new(repository: Arc<dyn ResourceRepository<C::Row>>, conversion: C) -> Self {
        ResourceService { repository, conversion }
    }

    pub fn repository(&self) -> &Arc<dyn ResourceRepository<C::Row>> {
        &self.repository
    }

    pub fn conversion(&self) -> &C {
        &self.conversion
    }

    pub async fn find_where(&self, criteria: &Criteria) -> Result<Vec<C::Resource>, AppError> {
        let rows = self.repository.find_all(criteria).await?;
        self.instantiate_all(rows)
    }

    pub async fn find_first(&self, criteria: &Criteria) -> Result<Option<C::Resource>, AppError> {
        Ok(self.find_where(criteria).await?.into_iter().next())
    }

    pub async fn find_page_where(
        &self,
        criteria: &Criteria,
        request: &PageRequest,
    ) -> Result<Page<C::Resource>, AppError> {
        self.repository
            .find_page(criteria, request)
            .await?
            .try_map(|r| self.conversion.instantiate(r))
    }

    /// Store without the existence checks of `create`/`update`.
    /// The row must instantiate back before it is written.
    pub async fn save(&self, resource: &C::Resource) -> Result<C::Resource, AppError> {
        let row = self.conversion.map(resource);
        self.conversion.instantiate(row.clone())?;
        let row = self.repository.save(row).await?;
        self.conversion.instantiate(row)
    }

    fn instantiate_all(&self, rows: Vec<C::Row>) -> Result<Vec<C::Resource>, AppError> {
        rows.into_iter().map(|r| self.conversion.instantiate(r)).collect()
    }

    async fn save_all(&self, resources: Vec<C::Resource>) -> Result<Vec<C::Resource>, AppError> {
        let rows: Vec<C::Row> = resources.iter().map(|r| self.conversion.map(r)).collect();
        for row in &rows {
            self.conversion.instantiate(row.clone())?;
        }
        let saved = self.repository.save_all(rows).await?;
        self.instantiate_all(saved)
    }

    fn describe(id: &str) -> String {
        format!("{} {}", <C::Row as ResourceRow>::TABLE.name, id)
    }
}

#[async_trait]
impl<C: Conversion> PagingService<C::Resource> for ResourceService<C> {
    async fn create(&self, resource: C::Resource) -> Result<C::Resource, AppError> {
        if self.repository.exists(resource.id()).await? {
            return Err(AppError::AlreadyExists(Self::describe(resource.id())));
        }
        self.save(&resource).await
    }

    async fn create_all(&self, resources: Vec<C::Resource>) -> Result<Vec<C::Resource>, AppError> {
        self.save_all(resources).await
    }

    async fn update(&self, resource: C::Resource) -> Result<C::Resource, AppError> {
        if !self.repository.exists(resource.id()).await? {
            return Err(AppError::NotFound(Self::describe(resource.id())));
        }
        self.save(&resource).await
    }

    async fn update_all(&self, resources: Vec<C::Resource>) -> Result<Vec<C::Resource>, AppError> {
        self.save_all(resources).await
    }

    async fn find_one(&self, id: &str) -> Result<C::Resource, AppError> {
        let row = self.repository.find_one(id).await?;
        self.conversion
            .instantiate_opt(row)?
            .ok_or_else(|| AppError::NotFound(Self::describe(id)))
    }

    async fn find_all(&self) -> Result<Vec<C::Resource>, AppError> {
        self.find_where(&Criteria::new()).await
    }

    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<C::Resource>, AppError> {
        let rows = self.repository.find_by_ids(ids).await?;
        self.instantiate_all(rows)
    }

    async fn find_page(&self, request: &PageRequest) -> Result<Page<C::Resource>, AppError> {
        self.find_page_where(&Criteria::new(), request).await
    }

    async fn exists(&self, id: &str) -> Result<bool, AppError> {
        self.repository.exists(id).await
    }

    async fn count(&self) -> Result<u64, AppError> {
        self.repository.count(&Criteria::new()).await
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        if !self.repository.exists(id).await? {
            return Err(AppError::NotFound(Self::describe(id)));
        }
        self.repository.delete(id).await
    }

    async fn delete_by_ids(&self, ids: &[String]) -> Result<bool, AppError> {
        self.repository.delete_by_ids(ids).await
    }

    async fn delete_all(&self) -> Result<bool, AppError> {
        self.repository.delete_all().await
    }
}
