//! Shared application state: services wired over Postgres or in-memory repositories.

use crate::config::AppConfig;
use crate::domain::{AccountService, CountryService, EventLogService, NewsService, PermissionService};
use crate::membership::{LoggingMembershipNotifications, MembershipNotifications, MembershipService};
use crate::resource::{InMemoryRepository, PgResourceRepository};
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    /// Absent when running over in-memory repositories.
    pub pool: Option<PgPool>,
    pub config: Arc<AppConfig>,
    pub countries: Arc<CountryService>,
    pub event_logs: Arc<EventLogService>,
    pub accounts: Arc<AccountService>,
    pub permissions: Arc<PermissionService>,
    pub news: Arc<NewsService>,
    pub membership: Arc<MembershipService>,
}

impl AppState {
    pub fn postgres(pool: PgPool, config: AppConfig) -> Self {
        let schema = config.schema.clone();
        let countries = Arc::new(CountryService::new(Arc::new(PgResourceRepository::new(
            pool.clone(),
            schema.clone(),
        ))));
        let event_logs = Arc::new(EventLogService::new(Arc::new(PgResourceRepository::new(
            pool.clone(),
            schema.clone(),
        ))));
        let accounts = Arc::new(AccountService::new(Arc::new(PgResourceRepository::new(
            pool.clone(),
            schema.clone(),
        ))));
        let permissions = Arc::new(PermissionService::new(
            Arc::new(PgResourceRepository::new(pool.clone(), schema.clone())),
            Arc::new(PgResourceRepository::new(pool.clone(), schema.clone())),
        ));
        let news = Arc::new(NewsService::new(
            Arc::new(PgResourceRepository::new(pool.clone(), schema)),
            accounts.clone(),
            event_logs.clone(),
        ));
        Self::assemble(Some(pool), config, countries, event_logs, accounts, permissions, news)
    }

    /// Same wiring over empty in-memory repositories.
    pub fn in_memory(config: AppConfig) -> Self {
        let countries = Arc::new(CountryService::new(Arc::new(InMemoryRepository::new())));
        let event_logs = Arc::new(EventLogService::new(Arc::new(InMemoryRepository::new())));
        let accounts = Arc::new(AccountService::new(Arc::new(InMemoryRepository::new())));
        let permissions = Arc::new(PermissionService::new(
            Arc::new(InMemoryRepository::new()),
            Arc::new(InMemoryRepository::new()),
        ));
        let news = Arc::new(NewsService::new(
            Arc::new(InMemoryRepository::new()),
            accounts.clone(),
            event_logs.clone(),
        ));
        Self::assemble(None, config, countries, event_logs, accounts, permissions, news)
    }

    fn assemble(
        pool: Option<PgPool>,
        config: AppConfig,
        countries: Arc<CountryService>,
        event_logs: Arc<EventLogService>,
        accounts: Arc<AccountService>,
        permissions: Arc<PermissionService>,
        news: Arc<NewsService>,
    ) -> Self {
        let notifications: Arc<dyn MembershipNotifications> =
            Arc::new(LoggingMembershipNotifications::new(config.mail_domain_url.clone()));
        let membership = Arc::new(MembershipService::new(accounts.clone(), permissions.clone(), notifications));
        AppState {
            pool,
            config: Arc::new(config),
            countries,
            event_logs,
            accounts,
            permissions,
            news,
            membership,
        }
    }
}
