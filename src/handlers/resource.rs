//! Generic resource controller: list (paged), read, create, update, delete over a `PagingService`.

use crate::case::properties_to_columns;
use crate::error::AppError;
use crate::resource::{PageRequest, PagingService, PersistentResource};
use crate::response::{success_one, success_one_ok, success_page};
use crate::sql::Direction;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Resource ⇄ API representation.
pub trait DtoConversion: Send + Sync + 'static {
    type Resource: PersistentResource;
    type Dto: Serialize + DeserializeOwned + Send + 'static;

    fn to_dto(&self, resource: &Self::Resource) -> Self::Dto;

    /// Build a resource from a request body. On update `existing` is the stored resource,
    /// whose id and creation date are kept.
    fn from_dto(&self, dto: Self::Dto, existing: Option<&Self::Resource>) -> Result<Self::Resource, AppError>;
}

/// Operations a controller exposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Operations {
    pub read: bool,
    pub create: bool,
    pub update: bool,
    pub delete: bool,
}

impl Operations {
    pub const ALL: Operations = Operations {
        read: true,
        create: true,
        update: true,
        delete: true,
    };
    pub const READ_ONLY: Operations = Operations {
        read: true,
        create: false,
        update: false,
        delete: false,
    };
    pub const READ_DELETE: Operations = Operations {
        read: true,
        create: false,
        update: false,
        delete: true,
    };

    fn check(allowed: bool, operation: &str) -> Result<(), AppError> {
        if allowed {
            Ok(())
        } else {
            Err(AppError::BadRequest(format!("{} not allowed", operation)))
        }
    }
}

/// Raw list query. Parsed by hand so that bad values map to `InvalidPageRequest`.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<String>,
    pub size: Option<String>,
    pub direction: Option<String>,
    pub properties: Option<String>,
}

impl PageParams {
    pub fn to_request(&self) -> Result<PageRequest, AppError> {
        let index = match self.page.as_deref() {
            None => 0,
            Some(p) => p
                .trim()
                .parse::<u32>()
                .map_err(|_| AppError::InvalidPageRequest(format!("page must be a non-negative integer, got '{}'", p)))?,
        };
        let size = match self.size.as_deref() {
            None => PageRequest::DEFAULT_SIZE,
            Some(s) => s
                .trim()
                .parse::<u32>()
                .map_err(|_| AppError::InvalidPageRequest(format!("size must be a positive integer, got '{}'", s)))?,
        };
        let direction = match self.direction.as_deref() {
            None => Direction::Asc,
            Some(d) => d.trim().parse().map_err(AppError::InvalidPageRequest)?,
        };
        let mut request = PageRequest::new(index, size)?;
        if let Some(properties) = self.properties.as_deref() {
            for column in properties_to_columns(properties) {
                request = request.with_sort(column, direction);
            }
        }
        Ok(request)
    }
}

pub struct ResourceController<D: DtoConversion> {
    pub service: Arc<dyn PagingService<D::Resource>>,
    pub dto: D,
    pub operations: Operations,
}

impl<D: DtoConversion> ResourceController<D> {
    pub fn new(service: Arc<dyn PagingService<D::Resource>>, dto: D, operations: Operations) -> Self {
        ResourceController {
            service,
            dto,
            operations,
        }
    }

    /// Routes at `base` and `base/:id`, restricted to the allowed operations.
    pub fn router<S>(self, base: &str) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        Router::new()
            .route(base, get(list::<D>).post(create::<D>))
            .route(
                &format!("{}/:id", base),
                get(read::<D>).put(update::<D>).delete(delete::<D>),
            )
            .with_state(Arc::new(self))
    }
}

pub async fn list<D: DtoConversion>(
    State(ctl): State<Arc<ResourceController<D>>>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    Operations::check(ctl.operations.read, "read")?;
    let request = params.to_request()?;
    let page = ctl.service.find_page(&request).await?;
    Ok(success_page(page.map(|r| ctl.dto.to_dto(&r)), request.index, request.size))
}

pub async fn read<D: DtoConversion>(
    State(ctl): State<Arc<ResourceController<D>>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Operations::check(ctl.operations.read, "read")?;
    let resource = ctl.service.find_one(&id).await?;
    Ok(success_one_ok(ctl.dto.to_dto(&resource)))
}

pub async fn create<D: DtoConversion>(
    State(ctl): State<Arc<ResourceController<D>>>,
    Json(body): Json<D::Dto>,
) -> Result<impl IntoResponse, AppError> {
    Operations::check(ctl.operations.create, "create")?;
    let resource = ctl.dto.from_dto(body, None)?;
    let created = ctl.service.create(resource).await?;
    Ok(success_one(ctl.dto.to_dto(&created)))
}

pub async fn update<D: DtoConversion>(
    State(ctl): State<Arc<ResourceController<D>>>,
    Path(id): Path<String>,
    Json(body): Json<D::Dto>,
) -> Result<impl IntoResponse, AppError> {
    Operations::check(ctl.operations.update, "update")?;
    let existing = ctl.service.find_one(&id).await?;
    let resource = ctl.dto.from_dto(body, Some(&existing))?;
    let updated = ctl.service.update(resource).await?;
    Ok(success_one_ok(ctl.dto.to_dto(&updated)))
}

pub async fn delete<D: DtoConversion>(
    State(ctl): State<Arc<ResourceController<D>>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Operations::check(ctl.operations.delete, "delete")?;
    ctl.service.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(page: Option<&str>, size: Option<&str>, direction: Option<&str>, properties: Option<&str>) -> PageParams {
        PageParams {
            page: page.map(String::from),
            size: size.map(String::from),
            direction: direction.map(String::from),
            properties: properties.map(String::from),
        }
    }

    #[test]
    fn defaults_to_first_page() {
        let request = PageParams::default().to_request().unwrap();
        assert_eq!(request.index, 0);
        assert_eq!(request.size, PageRequest::DEFAULT_SIZE);
        assert!(request.sorts.is_empty());
    }

    #[test]
    fn converts_properties_to_columns() {
        let request = params(Some("2"), Some("5"), Some("desc"), Some("creationDate,name"))
            .to_request()
            .unwrap();
        assert_eq!(request.index, 2);
        assert_eq!(request.sorts.get("creation_date"), Some(&Direction::Desc));
        assert_eq!(request.sorts.get("name"), Some(&Direction::Desc));
    }

    #[test]
    fn rejects_bad_values() {
        for p in [
            params(Some("-1"), None, None, None),
            params(Some("abc"), None, None, None),
            params(None, Some("0"), None, None),
            params(None, Some("1001"), None, None),
            params(None, None, Some("sideways"), None),
        ] {
            assert!(matches!(p.to_request(), Err(AppError::InvalidPageRequest(_))), "{:?}", p);
        }
    }
}
