//! Domain resources, their row mappings and services.

pub mod account;
pub mod country;
pub mod event_log;
pub mod news;
pub mod permission;

pub use account::{Account, AccountRow, AccountService, ACCOUNT_TABLE};
pub use country::{Country, CountryRow, CountryService, COUNTRY_TABLE};
pub use event_log::{EventLog, EventLogRow, EventLogService, EVENT_LOG_TABLE};
pub use news::{url_friendly, News, NewsRow, NewsService, NewsStatus, NEWS_TABLE};
pub use permission::{
    AccountPermission, AccountPermissionRow, Permission, ADMIN_PERMISSION, PermissionRow, PermissionService, ACCOUNT_PERMISSION_TABLE,
    PERMISSION_TABLE,
};

use crate::sql::Table;

/// Every table, parents before children.
pub const TABLES: &[&Table] = &[
    &COUNTRY_TABLE,
    &EVENT_LOG_TABLE,
    &ACCOUNT_TABLE,
    &PERMISSION_TABLE,
    &ACCOUNT_PERMISSION_TABLE,
    &NEWS_TABLE,
];
