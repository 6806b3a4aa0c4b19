//! Event log: timestamped descriptions of what happened.

use crate::error::AppError;
use crate::resource::{
    random_id, Conversion, PagingService, PersistentResource, ResourceRepository, ResourceRow, ResourceService,
};
use crate::sql::{Column, Criteria, Direction, SqlType, SqlValue, Table};
use crate::validation::require_text;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

pub const EVENT_LOG_TABLE: Table = Table {
    name: "event_log",
    id_column: "id",
    columns: &[
        Column::new("id", SqlType::Text),
        Column::new("creation_date", SqlType::Timestamp),
        Column::new("description", SqlType::Text),
    ],
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventLog {
    id: String,
    creation_date: DateTime<Utc>,
    pub description: String,
}

impl EventLog {
    pub fn new(
        id: impl Into<String>,
        creation_date: DateTime<Utc>,
        description: impl Into<String>,
    ) -> Result<Self, AppError> {
        Ok(EventLog {
            id: require_text("id", id.into())?,
            creation_date,
            description: require_text("description", description.into())?,
        })
    }
}

impl PersistentResource for EventLog {
    fn id(&self) -> &str {
        &self.id
    }

    fn creation_date(&self) -> DateTime<Utc> {
        self.creation_date
    }
}

/// Event logs order by creation date.
impl PartialOrd for EventLog {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EventLog {
    fn cmp(&self, other: &Self) -> Ordering {
        self.creation_date
            .cmp(&other.creation_date)
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl fmt::Display for EventLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventLog[{} at {}: {}]", self.id, self.creation_date.to_rfc3339(), self.description)
    }
}

#[derive(Clone, Debug, PartialEq, sqlx::FromRow)]
pub struct EventLogRow {
    pub id: String,
    pub creation_date: DateTime<Utc>,
    pub description: String,
}

impl ResourceRow for EventLogRow {
    const TABLE: &'static Table = &EVENT_LOG_TABLE;

    fn id(&self) -> &str {
        &self.id
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![
            self.id.clone().into(),
            self.creation_date.into(),
            self.description.clone().into(),
        ]
    }
}

pub struct EventLogConversion;

impl Conversion for EventLogConversion {
    type Resource = EventLog;
    type Row = EventLogRow;

    fn instantiate(&self, row: EventLogRow) -> Result<EventLog, AppError> {
        EventLog::new(row.id, row.creation_date, row.description)
    }

    fn map(&self, event_log: &EventLog) -> EventLogRow {
        EventLogRow {
            id: event_log.id.clone(),
            creation_date: event_log.creation_date,
            description: event_log.description.clone(),
        }
    }
}

pub struct EventLogService {
    resources: Arc<ResourceService<EventLogConversion>>,
}

impl EventLogService {
    pub fn new(repository: Arc<dyn ResourceRepository<EventLogRow>>) -> Self {
        EventLogService {
            resources: Arc::new(ResourceService::new(repository, EventLogConversion)),
        }
    }

    pub fn resources(&self) -> Arc<dyn PagingService<EventLog>> {
        self.resources.clone()
    }

    /// Record an event now.
    pub async fn create(&self, description: impl Into<String>) -> Result<EventLog, AppError> {
        let event_log = EventLog::new(random_id(), Utc::now(), description)?;
        tracing::info!(event = %event_log.description, "event logged");
        self.resources.create(event_log).await
    }

    /// Events created in [from, to], oldest first.
    pub async fn find_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<EventLog>, AppError> {
        let criteria = Criteria::new()
            .between("creation_date", from, to)
            .order_by("creation_date", Direction::Asc);
        self.resources.find_where(&criteria).await
    }
}
