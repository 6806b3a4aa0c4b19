//! News and their publication lifecycle: DRAFT, then VALIDATED, then PUBLISHED.
//!
//! Only drafts may be edited or deleted. Transitions are not guarded against the
//! prior status; publishing stamps a publication date, the other two clear it.

use super::account::{Account, AccountService};
use super::event_log::EventLogService;
use crate::error::AppError;
use crate::resource::{
    random_id, Conversion, Page, PageRequest, PagingService, PersistentResource, ResourceRepository, ResourceRow,
    ResourceService,
};
use crate::sql::{Column, Criteria, SqlType, SqlValue, Table};
use crate::validation::require_text;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub const NEWS_TABLE: Table = Table {
    name: "news",
    id_column: "id",
    columns: &[
        Column::new("id", SqlType::Text),
        Column::new("creation_date", SqlType::Timestamp),
        Column::new("author_id", SqlType::Text).references("account"),
        Column::new("title", SqlType::Text),
        Column::new("url_friendly_title", SqlType::Text),
        Column::new("description", SqlType::Text).unsortable(),
        Column::new("content", SqlType::Text).unsortable(),
        Column::new("source", SqlType::Text).nullable().unsortable(),
        Column::new("publication_date", SqlType::Timestamp).nullable(),
        Column::new("status", SqlType::Text),
    ],
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NewsStatus {
    Draft,
    Validated,
    Published,
}

impl NewsStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            NewsStatus::Draft => "DRAFT",
            NewsStatus::Validated => "VALIDATED",
            NewsStatus::Published => "PUBLISHED",
        }
    }
}

impl fmt::Display for NewsStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NewsStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DRAFT" => Ok(NewsStatus::Draft),
            "VALIDATED" => Ok(NewsStatus::Validated),
            "PUBLISHED" => Ok(NewsStatus::Published),
            other => Err(AppError::IllegalArgument(format!("unknown news status '{}'", other))),
        }
    }
}

/// Lowercase slug: alphanumeric runs joined by single dashes.
pub fn url_friendly(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;
    for c in title.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct News {
    id: String,
    creation_date: DateTime<Utc>,
    pub author_id: String,
    pub title: String,
    pub url_friendly_title: String,
    pub description: String,
    pub content: String,
    pub source: Option<String>,
    pub publication_date: Option<DateTime<Utc>>,
    pub status: NewsStatus,
}

impl News {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: impl Into<String>,
        creation_date: DateTime<Utc>,
        author_id: impl Into<String>,
        title: impl Into<String>,
        url_friendly_title: impl Into<String>,
        description: impl Into<String>,
        content: impl Into<String>,
        source: Option<String>,
        publication_date: Option<DateTime<Utc>>,
        status: NewsStatus,
    ) -> Result<Self, AppError> {
        Ok(News {
            id: require_text("id", id.into())?,
            creation_date,
            author_id: require_text("author_id", author_id.into())?,
            title: require_text("title", title.into())?,
            url_friendly_title: require_text("url_friendly_title", url_friendly_title.into())?,
            description: require_text("description", description.into())?,
            content: require_text("content", content.into())?,
            source,
            publication_date,
            status,
        })
    }
}

impl PersistentResource for News {
    fn id(&self) -> &str {
        &self.id
    }

    fn creation_date(&self) -> DateTime<Utc> {
        self.creation_date
    }
}

#[derive(Clone, Debug, PartialEq, sqlx::FromRow)]
pub struct NewsRow {
    pub id: String,
    pub creation_date: DateTime<Utc>,
    pub author_id: String,
    pub title: String,
    pub url_friendly_title: String,
    pub description: String,
    pub content: String,
    pub source: Option<String>,
    pub publication_date: Option<DateTime<Utc>>,
    pub status: String,
}

impl ResourceRow for NewsRow {
    const TABLE: &'static Table = &NEWS_TABLE;

    fn id(&self) -> &str {
        &self.id
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![
            self.id.clone().into(),
            self.creation_date.into(),
            self.author_id.clone().into(),
            self.title.clone().into(),
            self.url_friendly_title.clone().into(),
            self.description.clone().into(),
            self.content.clone().into(),
            self.source.clone().into(),
            self.publication_date.into(),
            self.status.clone().into(),
        ]
    }
}

pub struct NewsConversion;

impl Conversion for NewsConversion {
    type Resource = News;
    type Row = NewsRow;

    fn instantiate(&self, row: NewsRow) -> Result<News, AppError> {
        let status = row.status.parse()?;
        News::new(
            row.id,
            row.creation_date,
            row.author_id,
            row.title,
            row.url_friendly_title,
            row.description,
            row.content,
            row.source,
            row.publication_date,
            status,
        )
    }

    fn map(&self, news: &News) -> NewsRow {
        NewsRow {
            id: news.id.clone(),
            creation_date: news.creation_date,
            author_id: news.author_id.clone(),
            title: news.title.clone(),
            url_friendly_title: news.url_friendly_title.clone(),
            description: news.description.clone(),
            content: news.content.clone(),
            source: news.source.clone(),
            publication_date: news.publication_date,
            status: news.status.as_str().to_string(),
        }
    }
}

pub struct NewsService {
    resources: ResourceService<NewsConversion>,
    accounts: Arc<AccountService>,
    event_logs: Arc<EventLogService>,
}

impl NewsService {
    pub fn new(
        repository: Arc<dyn ResourceRepository<NewsRow>>,
        accounts: Arc<AccountService>,
        event_logs: Arc<EventLogService>,
    ) -> Self {
        NewsService {
            resources: ResourceService::new(repository, NewsConversion),
            accounts,
            event_logs,
        }
    }

    pub async fn find_by_status(&self, status: NewsStatus) -> Result<Vec<News>, AppError> {
        self.resources
            .find_where(&Criteria::new().eq("status", status.as_str()))
            .await
    }

    pub async fn mark_as_draft(&self, id: &str) -> Result<News, AppError> {
        let news = self.update_publication(id, NewsStatus::Draft).await?;
        self.event_logs
            .create(format!("The news {} has been put in draft", news.id()))
            .await?;
        Ok(news)
    }

    pub async fn mark_as_validated(&self, id: &str) -> Result<News, AppError> {
        let news = self.update_publication(id, NewsStatus::Validated).await?;
        self.event_logs
            .create(format!("The news {} has been validated for publication", news.id()))
            .await?;
        Ok(news)
    }

    pub async fn mark_as_published(&self, id: &str) -> Result<News, AppError> {
        let news = self.update_publication(id, NewsStatus::Published).await?;
        self.event_logs
            .create(format!("The news {} has been published", news.id()))
            .await?;
        Ok(news)
    }

    /// Each requested news with its author, if the author still exists.
    pub async fn author_by_news(&self, ids: &[String]) -> Result<Vec<(News, Option<Account>)>, AppError> {
        let news = self.resources.find_by_ids(ids).await?;
        let mut author_ids: Vec<String> = news.iter().map(|n| n.author_id.clone()).collect();
        author_ids.sort();
        author_ids.dedup();
        let authors: HashMap<String, Account> = self
            .accounts
            .resources()
            .find_by_ids(&author_ids)
            .await?
            .into_iter()
            .map(|a| (a.id().to_string(), a))
            .collect();
        Ok(news
            .into_iter()
            .map(|n| {
                let author = authors.get(&n.author_id).cloned();
                (n, author)
            })
            .collect())
    }

    async fn existing(&self, id: &str) -> Result<News, AppError> {
        self.resources
            .find_one(id)
            .await
            .map_err(|e| match e {
                AppError::NotFound(_) => AppError::NotFound(format!("news {} doesn't exist", id)),
                other => other,
            })
    }

    async fn existing_draft(&self, id: &str, action: &str) -> Result<News, AppError> {
        let news = self.existing(id).await?;
        if news.status != NewsStatus::Draft {
            return Err(AppError::IllegalState(format!(
                "news {} is not in draft, it can't be {}",
                id, action
            )));
        }
        Ok(news)
    }

    async fn update_publication(&self, id: &str, status: NewsStatus) -> Result<News, AppError> {
        let mut news = self.existing(id).await?;
        news.status = status;
        news.publication_date = match status {
            NewsStatus::Published => Some(Utc::now()),
            _ => None,
        };
        tracing::debug!(news_id = %id, status = %status, "news status changed");
        self.resources.save(&news).await
    }
}

#[async_trait]
impl PagingService<News> for NewsService {
    /// Fresh id and date, DRAFT, no publication date. The author must be enabled.
    async fn create(&self, news: News) -> Result<News, AppError> {
        let author = self.accounts.resources().find_one(&news.author_id).await?;
        if !author.enabled {
            return Err(AppError::IllegalState(format!(
                "account {} is not active",
                author.username
            )));
        }
        let draft = News::new(
            random_id(),
            Utc::now(),
            news.author_id,
            news.title,
            news.url_friendly_title,
            news.description,
            news.content,
            news.source,
            None,
            NewsStatus::Draft,
        )?;
        let created = self.resources.create(draft).await?;
        self.event_logs.create("A news has been created").await?;
        Ok(created)
    }

    async fn create_all(&self, news: Vec<News>) -> Result<Vec<News>, AppError> {
        let mut created = Vec::with_capacity(news.len());
        for n in news {
            created.push(self.create(n).await?);
        }
        Ok(created)
    }

    /// Editable fields only; the slug follows the title.
    async fn update(&self, news: News) -> Result<News, AppError> {
        let existing = self.existing_draft(news.id(), "updated").await?;
        let slug = url_friendly(&news.title);
        let edited = News::new(
            existing.id,
            existing.creation_date,
            existing.author_id,
            news.title,
            slug,
            news.description,
            news.content,
            news.source,
            existing.publication_date,
            existing.status,
        )?;
        self.resources.save(&edited).await
    }

    async fn update_all(&self, news: Vec<News>) -> Result<Vec<News>, AppError> {
        let mut updated = Vec::with_capacity(news.len());
        for n in news {
            updated.push(self.update(n).await?);
        }
        Ok(updated)
    }

    async fn find_one(&self, id: &str) -> Result<News, AppError> {
        self.resources.find_one(id).await
    }

    async fn find_all(&self) -> Result<Vec<News>, AppError> {
        self.resources.find_all().await
    }

    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<News>, AppError> {
        self.resources.find_by_ids(ids).await
    }

    async fn find_page(&self, request: &PageRequest) -> Result<Page<News>, AppError> {
        self.resources.find_page(request).await
    }

    async fn exists(&self, id: &str) -> Result<bool, AppError> {
        self.resources.exists(id).await
    }

    async fn count(&self) -> Result<u64, AppError> {
        self.resources.count().await
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        self.existing_draft(id, "deleted").await?;
        let deleted = self.resources.delete(id).await?;
        self.event_logs
            .create(format!("The news {} has been deleted", id))
            .await?;
        Ok(deleted)
    }

    async fn delete_by_ids(&self, ids: &[String]) -> Result<bool, AppError> {
        let news = self.resources.find_by_ids(ids).await?;
        if let Some(published) = news.iter().find(|n| n.status != NewsStatus::Draft) {
            return Err(AppError::IllegalState(format!(
                "news {} is not in draft, it can't be deleted",
                published.id()
            )));
        }
        self.resources.delete_by_ids(ids).await
    }

    async fn delete_all(&self) -> Result<bool, AppError> {
        let remaining = self
            .resources
            .repository()
            .count(&Criteria::new().is_in(
                "status",
                [NewsStatus::Validated.as_str(), NewsStatus::Published.as_str()],
            ))
            .await?;
        if remaining > 0 {
            return Err(AppError::IllegalState(format!(
                "{} news are not in draft, they can't be deleted",
                remaining
            )));
        }
        self.resources.delete_all().await
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::domain::account::fixtures::JOHN_ID;
    use chrono::TimeZone;

    pub fn news_row(id: &str, status: NewsStatus) -> NewsRow {
        NewsRow {
            id: id.into(),
            creation_date: Utc.with_ymd_and_hms(2017, 3, 1, 10, 0, 0).unwrap(),
            author_id: JOHN_ID.into(),
            title: format!("Title {}", id),
            url_friendly_title: format!("title-{}", id),
            description: "description".into(),
            content: "content".into(),
            source: Some("https://example.com".into()),
            publication_date: match status {
                NewsStatus::Published => Some(Utc.with_ymd_and_hms(2017, 3, 2, 10, 0, 0).unwrap()),
                _ => None,
            },
            status: status.as_str().into(),
        }
    }

    pub fn draft_input(author_id: &str) -> News {
        News::new(
            "ignored",
            Utc::now(),
            author_id,
            "Rust 2.0 is out",
            "rust-2-0-is-out",
            "short",
            "long content",
            None,
            Some(Utc::now()),
            NewsStatus::Published,
        )
        .unwrap()
    }
}
