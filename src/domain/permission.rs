//! Permissions and their grants to accounts.

use crate::error::AppError;
use crate::resource::{
    random_id, Conversion, PagingService, PersistentResource, ResourceRepository, ResourceRow, ResourceService,
};
use crate::sql::{Column, Criteria, Direction, SqlType, SqlValue, Table};
use crate::validation::require_text;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Id of the permission behind the `ROLE_ADMIN` authority.
pub const ADMIN_PERMISSION: &str = "ADMIN";

pub const PERMISSION_TABLE: Table = Table {
    name: "permission",
    id_column: "id",
    columns: &[
        Column::new("id", SqlType::Text),
        Column::new("creation_date", SqlType::Timestamp),
        Column::new("name", SqlType::Text).unique(),
    ],
};

pub const ACCOUNT_PERMISSION_TABLE: Table = Table {
    name: "account_permission",
    id_column: "id",
    columns: &[
        Column::new("id", SqlType::Text),
        Column::new("creation_date", SqlType::Timestamp),
        Column::new("account_id", SqlType::Text).references("account"),
        Column::new("permission_id", SqlType::Text).references("permission"),
    ],
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Permission {
    id: String,
    creation_date: DateTime<Utc>,
    pub name: String,
}

impl Permission {
    pub fn new(id: impl Into<String>, creation_date: DateTime<Utc>, name: impl Into<String>) -> Result<Self, AppError> {
        Ok(Permission {
            id: require_text("id", id.into())?,
            creation_date,
            name: require_text("name", name.into())?,
        })
    }
}

impl PersistentResource for Permission {
    fn id(&self) -> &str {
        &self.id
    }

    fn creation_date(&self) -> DateTime<Utc> {
        self.creation_date
    }
}

#[derive(Clone, Debug, PartialEq, sqlx::FromRow)]
pub struct PermissionRow {
    pub id: String,
    pub creation_date: DateTime<Utc>,
    pub name: String,
}

impl ResourceRow for PermissionRow {
    const TABLE: &'static Table = &PERMISSION_TABLE;

    fn id(&self) -> &str {
        &self.id
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![self.id.clone().into(), self.creation_date.into(), self.name.clone().into()]
    }
}

pub struct PermissionConversion;

impl Conversion for PermissionConversion {
    type Resource = Permission;
    type Row = PermissionRow;

    fn instantiate(&self, row: PermissionRow) -> Result<Permission, AppError> {
        Permission::new(row.id, row.creation_date, row.name)
    }

    fn map(&self, permission: &Permission) -> PermissionRow {
        PermissionRow {
            id: permission.id.clone(),
            creation_date: permission.creation_date,
            name: permission.name.clone(),
        }
    }
}

/// Grant of one permission to one account.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccountPermission {
    id: String,
    creation_date: DateTime<Utc>,
    pub account_id: String,
    pub permission_id: String,
}

impl AccountPermission {
    pub fn new(
        id: impl Into<String>,
        creation_date: DateTime<Utc>,
        account_id: impl Into<String>,
        permission_id: impl Into<String>,
    ) -> Result<Self, AppError> {
        Ok(AccountPermission {
            id: require_text("id", id.into())?,
            creation_date,
            account_id: require_text("account_id", account_id.into())?,
            permission_id: require_text("permission_id", permission_id.into())?,
        })
    }
}

impl PersistentResource for AccountPermission {
    fn id(&self) -> &str {
        &self.id
    }

    fn creation_date(&self) -> DateTime<Utc> {
        self.creation_date
    }
}

#[derive(Clone, Debug, PartialEq, sqlx::FromRow)]
pub struct AccountPermissionRow {
    pub id: String,
    pub creation_date: DateTime<Utc>,
    pub account_id: String,
    pub permission_id: String,
}

impl ResourceRow for AccountPermissionRow {
    const TABLE: &'static Table = &ACCOUNT_PERMISSION_TABLE;

    fn id(&self) -> &str {
        &self.id
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![
            self.id.clone().into(),
            self.creation_date.into(),
            self.account_id.clone().into(),
            self.permission_id.clone().into(),
        ]
    }
}

pub struct AccountPermissionConversion;

impl Conversion for AccountPermissionConversion {
    type Resource = AccountPermission;
    type Row = AccountPermissionRow;

    fn instantiate(&self, row: AccountPermissionRow) -> Result<AccountPermission, AppError> {
        AccountPermission::new(row.id, row.creation_date, row.account_id, row.permission_id)
    }

    fn map(&self, grant: &AccountPermission) -> AccountPermissionRow {
        AccountPermissionRow {
            id: grant.id.clone(),
            creation_date: grant.creation_date,
            account_id: grant.account_id.clone(),
            permission_id: grant.permission_id.clone(),
        }
    }
}

pub struct PermissionService {
    resources: Arc<ResourceService<PermissionConversion>>,
    grants: ResourceService<AccountPermissionConversion>,
}

impl PermissionService {
    pub fn new(
        repository: Arc<dyn ResourceRepository<PermissionRow>>,
        grants: Arc<dyn ResourceRepository<AccountPermissionRow>>,
    ) -> Self {
        PermissionService {
            resources: Arc::new(ResourceService::new(repository, PermissionConversion)),
            grants: ResourceService::new(grants, AccountPermissionConversion),
        }
    }

    pub fn resources(&self) -> Arc<dyn PagingService<Permission>> {
        self.resources.clone()
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Option<Permission>, AppError> {
        self.resources.find_first(&Criteria::new().eq("name", name)).await
    }

    /// Permissions granted to an account, ordered by name. An empty id has none.
    pub async fn find_for_account(&self, account_id: &str) -> Result<Vec<Permission>, AppError> {
        if account_id.trim().is_empty() {
            return Ok(Vec::new());
        }
        let permission_ids: Vec<String> = self
            .grants
            .find_where(&Criteria::new().eq("account_id", account_id))
            .await?
            .into_iter()
            .map(|g| g.permission_id)
            .collect();
        self.resources
            .find_where(
                &Criteria::new()
                    .is_in("id", permission_ids)
                    .order_by("name", Direction::Asc),
            )
            .await
    }

    /// Grant a permission. Granting one already held does nothing.
    pub async fn add_to_account(&self, account_id: &str, permission_id: &str) -> Result<(), AppError> {
        if !self.resources.exists(permission_id).await? {
            return Err(AppError::NotFound(format!("permission {}", permission_id)));
        }
        let granted = self
            .grants
            .repository()
            .count(
                &Criteria::new()
                    .eq("account_id", account_id)
                    .eq("permission_id", permission_id),
            )
            .await?;
        if granted > 0 {
            return Ok(());
        }
        let grant = AccountPermission::new(random_id(), Utc::now(), account_id, permission_id)?;
        self.grants.create(grant).await?;
        tracing::info!(account_id, permission_id, "permission granted");
        Ok(())
    }

    pub async fn remove_from_account(&self, account_id: &str, permission_id: &str) -> Result<(), AppError> {
        let removed = self
            .grants
            .repository()
            .delete_where(
                &Criteria::new()
                    .eq("account_id", account_id)
                    .eq("permission_id", permission_id),
            )
            .await?;
        tracing::info!(account_id, permission_id, removed, "permission revoked");
        Ok(())
    }

    pub async fn remove_all_from_account(&self, account_id: &str) -> Result<(), AppError> {
        self.grants
            .repository()
            .delete_where(&Criteria::new().eq("account_id", account_id))
            .await?;
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::resource::InMemoryRepository;

    fn service() -> PermissionService {
        PermissionService::new(
            Arc::new(InMemoryRepository::with_rows(permission_rows())),
            Arc::new(InMemoryRepository::new()),
        )
    }

    #[test]
    fn round_trips_through_rows() {
        let row = permission_row("ADMIN", "administrator");
        let permission = PermissionConversion.instantiate(row.clone()).unwrap();
        assert_eq!(PermissionConversion.map(&permission), row);

        let grant = AccountPermission::new("g1", Utc::now(), "a1", "ADMIN").unwrap();
        assert_eq!(
            AccountPermissionConversion
                .instantiate(AccountPermissionConversion.map(&grant))
                .unwrap(),
            grant
        );
        assert!(AccountPermissionConversion.map_opt(None).is_none());
    }

    #[test]
    fn grant_columns_reference_their_tables() {
        assert_eq!(ACCOUNT_PERMISSION_TABLE.column("account_id").unwrap().references, Some("account"));
        assert_eq!(ACCOUNT_PERMISSION_TABLE.column("permission_id").unwrap().references, Some("permission"));
    }

    #[tokio::test]
    async fn lists_granted_permissions_by_name() {
        let service = service();
        service.add_to_account("a1", "EDITOR").await.unwrap();
        service.add_to_account("a1", "ADMIN").await.unwrap();
        service.add_to_account("a2", "AUTHOR").await.unwrap();

        let names: Vec<_> = service
            .find_for_account("a1")
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["administrator", "editor"]);
    }

    #[tokio::test]
    async fn empty_account_id_has_no_permissions() {
        assert!(service().find_for_account("").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn granting_twice_keeps_one_grant() {
        let service = service();
        service.add_to_account("a1", "ADMIN").await.unwrap();
        service.add_to_account("a1", "ADMIN").await.unwrap();
        assert_eq!(service.grants.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn granting_unknown_permission_fails() {
        let result = service().add_to_account("a1", "NOPE").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn removes_one_or_all_grants() {
        let service = service();
        for id in ["ADMIN", "EDITOR", "AUTHOR"] {
            service.add_to_account("a1", id).await.unwrap();
        }
        service.add_to_account("a2", "ADMIN").await.unwrap();

        service.remove_from_account("a1", "EDITOR").await.unwrap();
        assert_eq!(service.find_for_account("a1").await.unwrap().len(), 2);

        service.remove_all_from_account("a1").await.unwrap();
        assert!(service.find_for_account("a1").await.unwrap().is_empty());
        assert_eq!(service.find_for_account("a2").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn finds_by_name() {
        let found = service().find_by_name("editor").await.unwrap().unwrap();
        assert_eq!(found.id(), "EDITOR");
    }
}
