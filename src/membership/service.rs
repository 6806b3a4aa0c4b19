//! Sign-up, activation, password renewal and user details.

use super::details::UserDetails;
use super::encryption::{hash_password, new_token, tokens_match, verify_password, AccountEncryption};
use super::notifications::MembershipNotifications;
use super::request::SignUpRequest;
use crate::config::AdminSeed;
use crate::domain::{Account, AccountService, Permission, PermissionService, ADMIN_PERMISSION};
use crate::error::AppError;
use crate::resource::{random_id, PersistentResource};
use crate::validation::{validate, Rule};
use chrono::Utc;
use std::sync::Arc;

pub struct MembershipService {
    accounts: Arc<AccountService>,
    permissions: Arc<PermissionService>,
    notifications: Arc<dyn MembershipNotifications>,
}

impl MembershipService {
    pub fn new(
        accounts: Arc<AccountService>,
        permissions: Arc<PermissionService>,
        notifications: Arc<dyn MembershipNotifications>,
    ) -> Self {
        MembershipService {
            accounts,
            permissions,
            notifications,
        }
    }

    /// Creates a disabled account with a fresh token. Username and email must be unused.
    pub async fn sign_up(&self, request: SignUpRequest) -> Result<Account, AppError> {
        request.validate()?;
        if self
            .accounts
            .exists_by_username_or_email(&request.username, &request.email)
            .await?
        {
            return Err(AppError::UserDetailsAlreadyExist(format!(
                "username or email already used: {}",
                request
            )));
        }
        let encryption = AccountEncryption::new(&request.password)?;
        let account = Account::new(
            random_id(),
            Utc::now(),
            request.username,
            request.email,
            false,
            encryption.password,
            encryption.token,
        )?;
        let created = self.accounts.resources().create(account).await?;
        self.notifications.on_sign_up(&created).await;
        Ok(created)
    }

    /// Enables the account when the token matches; the token is then rotated.
    pub async fn activate(&self, account_id: &str, token: &str) -> Result<Account, AppError> {
        let account = self.accounts.resources().find_one(account_id).await?;
        check_token(&account, token, "activate")?;
        let activated = account.with_credentials(true, account.password.clone(), new_token());
        let updated = self.accounts.resources().update(activated).await?;
        self.notifications.on_activate(&updated).await;
        Ok(updated)
    }

    /// Rotates the token of the account owning `email` and sends it a reset link.
    /// Unknown emails are ignored, so the answer does not reveal which emails have accounts.
    pub async fn new_password(&self, email: &str) -> Result<Option<Account>, AppError> {
        let Some(account) = self.accounts.find_by_email(email).await? else {
            tracing::debug!("new password requested for an unknown email");
            return Ok(None);
        };
        let renewed = account.with_credentials(account.enabled, account.password.clone(), new_token());
        let updated = self.accounts.resources().update(renewed).await?;
        self.notifications.on_new_password(&updated).await;
        Ok(Some(updated))
    }

    /// Stores a new password when the token matches. The account ends up enabled with a new token.
    pub async fn reset_password(&self, account_id: &str, token: &str, new_password: &str) -> Result<Account, AppError> {
        validate("password", Some(new_password), &Rule::required().min_length(6).max_length(128))?;
        let account = self.accounts.resources().find_one(account_id).await?;
        check_token(&account, token, "reset the password of")?;
        let reset = account.with_credentials(true, hash_password(new_password)?, new_token());
        let updated = self.accounts.resources().update(reset).await?;
        self.notifications.on_reset_password(&updated).await;
        Ok(updated)
    }

    /// Makes sure the seeded administrator exists, is enabled and holds the ADMIN permission.
    /// An existing account keeps its password.
    pub async fn ensure_admin(&self, seed: &AdminSeed) -> Result<Account, AppError> {
        let permissions = self.permissions.resources();
        if !permissions.exists(ADMIN_PERMISSION).await? {
            permissions
                .create(Permission::new(ADMIN_PERMISSION, Utc::now(), "administrator")?)
                .await?;
        }
        let account = match self.accounts.find_by_username(&seed.username).await? {
            Some(account) if account.enabled => account,
            Some(account) => {
                let enabled = account.with_credentials(true, account.password.clone(), account.token.clone());
                self.accounts.resources().update(enabled).await?
            }
            None => {
                let request = SignUpRequest::new(&seed.username, &seed.email, &seed.password);
                request.validate()?;
                let encryption = AccountEncryption::new(&request.password)?;
                let account = Account::new(
                    random_id(),
                    Utc::now(),
                    request.username,
                    request.email,
                    true,
                    encryption.password,
                    encryption.token,
                )?;
                self.accounts.resources().create(account).await?
            }
        };
        self.permissions.add_to_account(account.id(), ADMIN_PERMISSION).await?;
        tracing::info!(account = %account, "administrator ensured");
        Ok(account)
    }

    /// Enabled accounts only. Authorities are `ROLE_<permission id>`.
    pub async fn load_user_details(&self, username: &str) -> Result<UserDetails, AppError> {
        let account = self
            .accounts
            .find_by_username_and_enabled(username)
            .await?
            .ok_or_else(|| AppError::Unauthorized("username not found".into()))?;
        let authorities = self
            .permissions
            .find_for_account(account.id())
            .await?
            .iter()
            .map(|p| UserDetails::authority(p.id()))
            .collect();
        Ok(UserDetails {
            username: account.username,
            password: account.password,
            authorities,
        })
    }

    pub async fn authenticate(&self, username: &str, password: &str) -> Result<UserDetails, AppError> {
        let details = self.load_user_details(username).await?;
        if !verify_password(password, &details.password) {
            return Err(AppError::Unauthorized("bad credentials".into()));
        }
        Ok(details)
    }
}

fn check_token(account: &Account, token: &str, action: &str) -> Result<(), AppError> {
    if !tokens_match(&account.token, token) {
        tracing::warn!(account = %account, "an attempt to {} an account with an invalid token has been made", action);
        return Err(AppError::IllegalArgument(format!("token is not valid for {}", account)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::fixtures::{jane_row, john_row, JANE_ID, JOHN_ID};
    use crate::domain::permission::fixtures::permission_rows;
    use crate::resource::InMemoryRepository;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingNotifications {
        events: Mutex<Vec<String>>,
    }

    impl RecordingNotifications {
        fn record(&self, event: &str, account: &Account) {
            self.events.lock().unwrap().push(format!("{}:{}", event, account.username));
        }

        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MembershipNotifications for RecordingNotifications {
        async fn on_sign_up(&self, account: &Account) {
            self.record("sign_up", account);
        }

        async fn on_activate(&self, account: &Account) {
            self.record("activate", account);
        }

        async fn on_new_password(&self, account: &Account) {
            self.record("new_password", account);
        }

        async fn on_reset_password(&self, account: &Account) {
            self.record("reset_password", account);
        }
    }

    struct Fixture {
        membership: MembershipService,
        accounts: Arc<AccountService>,
        permissions: Arc<PermissionService>,
        notifications: Arc<RecordingNotifications>,
    }

    fn fixture() -> Fixture {
        let mut john = john_row();
        john.password = hash_password("john-password").unwrap();
        let accounts = Arc::new(AccountService::new(Arc::new(InMemoryRepository::with_rows(vec![
            john,
            jane_row(),
        ]))));
        let permissions = Arc::new(PermissionService::new(
            Arc::new(InMemoryRepository::with_rows(permission_rows())),
            Arc::new(InMemoryRepository::new()),
        ));
        let notifications = Arc::new(RecordingNotifications::default());
        Fixture {
            membership: MembershipService::new(accounts.clone(), permissions.clone(), notifications.clone()),
            accounts,
            permissions,
            notifications,
        }
    }

    #[tokio::test]
    async fn sign_up_creates_disabled_account() {
        let f = fixture();
        let account = f
            .membership
            .sign_up(SignUpRequest::new("bob", "bob@doe.com", "bob-password"))
            .await
            .unwrap();
        assert!(!account.enabled);
        assert!(!account.token.is_empty());
        assert!(verify_password("bob-password", &account.password));
        assert_eq!(f.notifications.events(), vec!["sign_up:bob"]);
    }

    #[tokio::test]
    async fn sign_up_rejects_taken_details() {
        let f = fixture();
        let taken_username = f
            .membership
            .sign_up(SignUpRequest::new("JOHN", "other@doe.com", "password"))
            .await;
        assert!(matches!(taken_username, Err(AppError::UserDetailsAlreadyExist(_))));
        let taken_email = f
            .membership
            .sign_up(SignUpRequest::new("other", "jane@doe.com", "password"))
            .await;
        assert!(matches!(taken_email, Err(AppError::UserDetailsAlreadyExist(_))));
        assert!(f.notifications.events().is_empty());
    }

    #[tokio::test]
    async fn sign_up_validates_request() {
        let result = fixture()
            .membership
            .sign_up(SignUpRequest::new("bob", "bob", "bob-password"))
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn activation_enables_and_rotates_token() {
        let f = fixture();
        let activated = f.membership.activate(JANE_ID, "jane-token").await.unwrap();
        assert!(activated.enabled);
        assert_ne!(activated.token, "jane-token");
        assert!(f.accounts.find_by_username_and_enabled("jane").await.unwrap().is_some());
        assert_eq!(f.notifications.events(), vec!["activate:jane"]);
    }

    #[tokio::test]
    async fn activation_with_wrong_token_fails() {
        let f = fixture();
        let result = f.membership.activate(JANE_ID, "wrong").await;
        assert!(matches!(result, Err(AppError::IllegalArgument(_))));
        assert!(f.accounts.find_by_username_and_enabled("jane").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn new_password_rotates_token() {
        let f = fixture();
        let renewed = f.membership.new_password("JOHN@doe.com").await.unwrap().unwrap();
        assert_ne!(renewed.token, "john-token");
        assert!(f.membership.new_password("nobody@doe.com").await.unwrap().is_none());
        assert_eq!(f.notifications.events(), vec!["new_password:john"]);
    }

    #[tokio::test]
    async fn reset_password_checks_token() {
        let f = fixture();
        let result = f.membership.reset_password(JOHN_ID, "wrong", "new-password").await;
        assert!(matches!(result, Err(AppError::IllegalArgument(_))));

        let reset = f
            .membership
            .reset_password(JOHN_ID, "john-token", "new-password")
            .await
            .unwrap();
        assert!(verify_password("new-password", &reset.password));
        assert_ne!(reset.token, "john-token");
        assert!(f.membership.authenticate("john", "new-password").await.is_ok());
    }

    #[tokio::test]
    async fn user_details_carry_role_authorities() {
        let f = fixture();
        f.permissions.add_to_account(JOHN_ID, "ADMIN").await.unwrap();
        let details = f.membership.load_user_details("john").await.unwrap();
        assert!(details.has_authority("ROLE_ADMIN"));
        assert!(!details.has_authority("ROLE_EDITOR"));
    }

    fn seed(username: &str) -> AdminSeed {
        AdminSeed {
            username: username.into(),
            email: format!("{}@doe.com", username),
            password: "root-password".into(),
        }
    }

    #[tokio::test]
    async fn ensure_admin_creates_the_permission_and_account() {
        let accounts = Arc::new(AccountService::new(Arc::new(InMemoryRepository::new())));
        let permissions = Arc::new(PermissionService::new(
            Arc::new(InMemoryRepository::new()),
            Arc::new(InMemoryRepository::new()),
        ));
        let membership = MembershipService::new(
            accounts.clone(),
            permissions.clone(),
            Arc::new(RecordingNotifications::default()),
        );

        let admin = membership.ensure_admin(&seed("root")).await.unwrap();
        assert!(admin.enabled);
        let details = membership.authenticate("root", "root-password").await.unwrap();
        assert!(details.has_authority("ROLE_ADMIN"));

        membership.ensure_admin(&seed("root")).await.unwrap();
        assert_eq!(accounts.resources().count().await.unwrap(), 1);
        assert_eq!(permissions.find_for_account(admin.id()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn ensure_admin_enables_an_existing_account() {
        let f = fixture();
        let admin = f.membership.ensure_admin(&seed("jane")).await.unwrap();
        assert_eq!(admin.id(), JANE_ID);
        assert!(admin.enabled);
        assert_eq!(admin.password, jane_row().password);
        let held = f.permissions.find_for_account(JANE_ID).await.unwrap();
        assert_eq!(held.iter().map(|p| p.id()).collect::<Vec<_>>(), vec!["ADMIN"]);
        assert!(f.notifications.events().is_empty());
    }

    #[tokio::test]
    async fn disabled_accounts_have_no_user_details() {
        let result = fixture().membership.load_user_details("jane").await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn authenticate_checks_password() {
        let f = fixture();
        assert!(f.membership.authenticate("john", "john-password").await.is_ok());
        assert!(matches!(
            f.membership.authenticate("john", "nope").await,
            Err(AppError::Unauthorized(_))
        ));
    }
}
