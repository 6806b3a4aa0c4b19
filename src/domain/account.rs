//! User accounts. Password holds a hash, token the current activation/reset token.

use crate::error::AppError;
use crate::resource::{Conversion, PagingService, PersistentResource, ResourceRepository, ResourceRow, ResourceService};
use crate::sql::{Column, Criteria, SqlType, SqlValue, Table};
use crate::validation::require_text;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;

pub const ACCOUNT_TABLE: Table = Table {
    name: "account",
    id_column: "id",
    columns: &[
        Column::new("id", SqlType::Text),
        Column::new("creation_date", SqlType::Timestamp),
        Column::new("username", SqlType::Text).unique(),
        Column::new("email", SqlType::Text).unique(),
        Column::new("enabled", SqlType::Boolean),
        Column::new("password", SqlType::Text).unsortable(),
        Column::new("token", SqlType::Text).unsortable(),
    ],
};

#[derive(Clone, PartialEq, Eq)]
pub struct Account {
    id: String,
    creation_date: DateTime<Utc>,
    pub username: String,
    pub email: String,
    pub enabled: bool,
    pub password: String,
    pub token: String,
}

impl Account {
    pub fn new(
        id: impl Into<String>,
        creation_date: DateTime<Utc>,
        username: impl Into<String>,
        email: impl Into<String>,
        enabled: bool,
        password: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self, AppError> {
        Ok(Account {
            id: require_text("id", id.into())?,
            creation_date,
            username: require_text("username", username.into())?,
            email: require_text("email", email.into())?,
            enabled,
            password: require_text("password", password.into())?,
            token: require_text("token", token.into())?,
        })
    }

    /// Same account, enabled or not, with a new password hash and token.
    pub fn with_credentials(&self, enabled: bool, password: String, token: String) -> Self {
        Account {
            enabled,
            password,
            token,
            ..self.clone()
        }
    }
}

impl PersistentResource for Account {
    fn id(&self) -> &str {
        &self.id
    }

    fn creation_date(&self) -> DateTime<Utc> {
        self.creation_date
    }
}

// Secrets stay out of logs.
impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("creation_date", &self.creation_date)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Account[{}, {}, {}]", self.id, self.username, self.email)
    }
}

#[derive(Clone, PartialEq, sqlx::FromRow)]
pub struct AccountRow {
    pub id: String,
    pub creation_date: DateTime<Utc>,
    pub username: String,
    pub email: String,
    pub enabled: bool,
    pub password: String,
    pub token: String,
}

impl fmt::Debug for AccountRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountRow")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

impl ResourceRow for AccountRow {
    const TABLE: &'static Table = &ACCOUNT_TABLE;

    fn id(&self) -> &str {
        &self.id
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![
            self.id.clone().into(),
            self.creation_date.into(),
            self.username.clone().into(),
            self.email.clone().into(),
            self.enabled.into(),
            self.password.clone().into(),
            self.token.clone().into(),
        ]
    }
}

pub struct AccountConversion;

impl Conversion for AccountConversion {
    type Resource = Account;
    type Row = AccountRow;

    fn instantiate(&self, row: AccountRow) -> Result<Account, AppError> {
        Account::new(
            row.id,
            row.creation_date,
            row.username,
            row.email,
            row.enabled,
            row.password,
            row.token,
        )
    }

    fn map(&self, account: &Account) -> AccountRow {
        AccountRow {
            id: account.id.clone(),
            creation_date: account.creation_date,
            username: account.username.clone(),
            email: account.email.clone(),
            enabled: account.enabled,
            password: account.password.clone(),
            token: account.token.clone(),
        }
    }
}

pub struct AccountService {
    resources: Arc<ResourceService<AccountConversion>>,
}

impl AccountService {
    pub fn new(repository: Arc<dyn ResourceRepository<AccountRow>>) -> Self {
        AccountService {
            resources: Arc::new(ResourceService::new(repository, AccountConversion)),
        }
    }

    pub fn resources(&self) -> Arc<dyn PagingService<Account>> {
        self.resources.clone()
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<Account>, AppError> {
        self.resources
            .find_first(&Criteria::new().eq_ignore_case("username", username))
            .await
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AppError> {
        self.resources
            .find_first(&Criteria::new().eq_ignore_case("email", email))
            .await
    }

    pub async fn find_by_username_and_enabled(&self, username: &str) -> Result<Option<Account>, AppError> {
        self.resources
            .find_first(
                &Criteria::new()
                    .eq_ignore_case("username", username)
                    .eq("enabled", true),
            )
            .await
    }

    pub async fn find_by_enabled(&self, enabled: bool) -> Result<Vec<Account>, AppError> {
        self.resources.find_where(&Criteria::new().eq("enabled", enabled)).await
    }

    /// Whether the username or the email is already used by any account.
    pub async fn exists_by_username_or_email(&self, username: &str, email: &str) -> Result<bool, AppError> {
        Ok(self.find_by_username(username).await?.is_some() || self.find_by_email(email).await?.is_some())
    }
}
