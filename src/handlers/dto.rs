//! API representations (camelCase JSON) and their conversions.

use super::resource::DtoConversion;
use crate::domain::{url_friendly, Account, Country, EventLog, News, NewsStatus, Permission};
use crate::error::AppError;
use crate::resource::{random_id, PersistentResource};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Id and creation date for a resource being written: kept from the stored one,
/// otherwise the requested id (if any) and now.
fn identity(existing: Option<&impl PersistentResource>, requested_id: Option<String>) -> (String, DateTime<Utc>) {
    match existing {
        Some(e) => (e.id().to_string(), e.creation_date()),
        None => (
            requested_id.filter(|id| !id.trim().is_empty()).unwrap_or_else(random_id),
            Utc::now(),
        ),
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryDto {
    pub id: Option<String>,
    pub creation_date: Option<DateTime<Utc>>,
    pub code: String,
    pub name: String,
}

pub struct CountryDtoConversion;

impl DtoConversion for CountryDtoConversion {
    type Resource = Country;
    type Dto = CountryDto;

    fn to_dto(&self, country: &Country) -> CountryDto {
        CountryDto {
            id: Some(country.id().to_string()),
            creation_date: Some(country.creation_date()),
            code: country.code.clone(),
            name: country.name.clone(),
        }
    }

    fn from_dto(&self, dto: CountryDto, existing: Option<&Country>) -> Result<Country, AppError> {
        let (id, creation_date) = identity(existing, None);
        Country::new(id, creation_date, dto.code, dto.name)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionDto {
    pub id: Option<String>,
    pub creation_date: Option<DateTime<Utc>>,
    pub name: String,
}

/// Permission ids name roles (`ADMIN` gives `ROLE_ADMIN`), so a create may choose its id.
pub struct PermissionDtoConversion;

impl DtoConversion for PermissionDtoConversion {
    type Resource = Permission;
    type Dto = PermissionDto;

    fn to_dto(&self, permission: &Permission) -> PermissionDto {
        PermissionDto {
            id: Some(permission.id().to_string()),
            creation_date: Some(permission.creation_date()),
            name: permission.name.clone(),
        }
    }

    fn from_dto(&self, dto: PermissionDto, existing: Option<&Permission>) -> Result<Permission, AppError> {
        let (id, creation_date) = identity(existing, dto.id);
        Permission::new(id, creation_date, dto.name)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventLogDto {
    pub id: Option<String>,
    pub creation_date: Option<DateTime<Utc>>,
    pub description: String,
}

pub struct EventLogDtoConversion;

impl DtoConversion for EventLogDtoConversion {
    type Resource = EventLog;
    type Dto = EventLogDto;

    fn to_dto(&self, event_log: &EventLog) -> EventLogDto {
        EventLogDto {
            id: Some(event_log.id().to_string()),
            creation_date: Some(event_log.creation_date()),
            description: event_log.description.clone(),
        }
    }

    fn from_dto(&self, dto: EventLogDto, existing: Option<&EventLog>) -> Result<EventLog, AppError> {
        let (id, creation_date) = identity(existing, None);
        EventLog::new(id, creation_date, dto.description)
    }
}

/// Accounts are exposed without password or token.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDto {
    pub id: Option<String>,
    pub creation_date: Option<DateTime<Utc>>,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub enabled: bool,
}

pub struct AccountDtoConversion;

impl DtoConversion for AccountDtoConversion {
    type Resource = Account;
    type Dto = AccountDto;

    fn to_dto(&self, account: &Account) -> AccountDto {
        AccountDto {
            id: Some(account.id().to_string()),
            creation_date: Some(account.creation_date()),
            username: account.username.clone(),
            email: account.email.clone(),
            enabled: account.enabled,
        }
    }

    /// Credentials stay with the stored account; new accounts go through sign-up.
    fn from_dto(&self, dto: AccountDto, existing: Option<&Account>) -> Result<Account, AppError> {
        let existing = existing.ok_or_else(|| AppError::BadRequest("accounts are created through sign-up".into()))?;
        Account::new(
            existing.id(),
            existing.creation_date(),
            dto.username,
            dto.email,
            dto.enabled,
            existing.password.clone(),
            existing.token.clone(),
        )
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsDto {
    pub id: Option<String>,
    pub creation_date: Option<DateTime<Utc>>,
    pub author_id: String,
    pub title: String,
    pub url_friendly_title: Option<String>,
    pub description: String,
    pub content: String,
    pub source: Option<String>,
    pub publication_date: Option<DateTime<Utc>>,
    pub status: Option<NewsStatus>,
}

pub struct NewsDtoConversion;

impl DtoConversion for NewsDtoConversion {
    type Resource = News;
    type Dto = NewsDto;

    fn to_dto(&self, news: &News) -> NewsDto {
        NewsDto {
            id: Some(news.id().to_string()),
            creation_date: Some(news.creation_date()),
            author_id: news.author_id.clone(),
            title: news.title.clone(),
            url_friendly_title: Some(news.url_friendly_title.clone()),
            description: news.description.clone(),
            content: news.content.clone(),
            source: news.source.clone(),
            publication_date: news.publication_date,
            status: Some(news.status),
        }
    }

    /// Status and publication date come from the stored news; the service owns the lifecycle.
    fn from_dto(&self, dto: NewsDto, existing: Option<&News>) -> Result<News, AppError> {
        let (id, creation_date) = identity(existing, None);
        let slug = dto
            .url_friendly_title
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| url_friendly(&dto.title));
        News::new(
            id,
            creation_date,
            dto.author_id,
            dto.title,
            slug,
            dto.description,
            dto.content,
            dto.source,
            existing.and_then(|e| e.publication_date),
            existing.map(|e| e.status).unwrap_or(NewsStatus::Draft),
        )
    }
}
