//! Countries, keyed by ISO code.

use crate::error::AppError;
use crate::resource::{Conversion, PagingService, PersistentResource, ResourceRepository, ResourceRow, ResourceService};
use crate::sql::{Column, Criteria, SqlType, SqlValue, Table};
use crate::validation::require_text;
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub const COUNTRY_TABLE: Table = Table {
    name: "country",
    id_column: "id",
    columns: &[
        Column::new("id", SqlType::Text),
        Column::new("creation_date", SqlType::Timestamp),
        Column::new("code", SqlType::Text).unique(),
        Column::new("name", SqlType::Text),
    ],
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Country {
    id: String,
    creation_date: DateTime<Utc>,
    pub code: String,
    pub name: String,
}

impl Country {
    pub fn new(
        id: impl Into<String>,
        creation_date: DateTime<Utc>,
        code: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<Self, AppError> {
        Ok(Country {
            id: require_text("id", id.into())?,
            creation_date,
            code: require_text("code", code.into())?,
            name: require_text("name", name.into())?,
        })
    }
}

impl PersistentResource for Country {
    fn id(&self) -> &str {
        &self.id
    }

    fn creation_date(&self) -> DateTime<Utc> {
        self.creation_date
    }
}

#[derive(Clone, Debug, PartialEq, sqlx::FromRow)]
pub struct CountryRow {
    pub id: String,
    pub creation_date: DateTime<Utc>,
    pub code: String,
    pub name: String,
}

impl ResourceRow for CountryRow {
    const TABLE: &'static Table = &COUNTRY_TABLE;

    fn id(&self) -> &str {
        &self.id
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![
            self.id.clone().into(),
            self.creation_date.into(),
            self.code.clone().into(),
            self.name.clone().into(),
        ]
    }
}

pub struct CountryConversion;

impl Conversion for CountryConversion {
    type Resource = Country;
    type Row = CountryRow;

    fn instantiate(&self, row: CountryRow) -> Result<Country, AppError> {
        Country::new(row.id, row.creation_date, row.code, row.name)
    }

    fn map(&self, country: &Country) -> CountryRow {
        CountryRow {
            id: country.id.clone(),
            creation_date: country.creation_date,
            code: country.code.clone(),
            name: country.name.clone(),
        }
    }
}

pub struct CountryService {
    resources: Arc<ResourceService<CountryConversion>>,
}

impl CountryService {
    pub fn new(repository: Arc<dyn ResourceRepository<CountryRow>>) -> Self {
        CountryService {
            resources: Arc::new(ResourceService::new(repository, CountryConversion)),
        }
    }

    pub fn resources(&self) -> Arc<dyn PagingService<Country>> {
        self.resources.clone()
    }

    /// Case-insensitive lookup by code.
    pub async fn find_by_code(&self, code: &str) -> Result<Option<Country>, AppError> {
        self.resources
            .find_first(&Criteria::new().eq_ignore_case("code", code))
            .await
    }
}
