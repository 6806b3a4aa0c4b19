//! Membership notifications. Delivery is best effort: failures are logged, never propagated.

use crate::domain::Account;
use crate::resource::PersistentResource;
use async_trait::async_trait;

#[async_trait]
pub trait MembershipNotifications: Send + Sync {
    async fn on_sign_up(&self, account: &Account);

    async fn on_activate(&self, account: &Account);

    async fn on_new_password(&self, account: &Account);

    async fn on_reset_password(&self, account: &Account);
}

/// Writes notifications to the log, with the links a mail would carry.
pub struct LoggingMembershipNotifications {
    domain_url: String,
}

impl LoggingMembershipNotifications {
    pub fn new(domain_url: impl Into<String>) -> Self {
        LoggingMembershipNotifications {
            domain_url: domain_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn activation_link(&self, account: &Account) -> String {
        format!("{}/membership/activate/{}/{}", self.domain_url, account.id(), account.token)
    }

    pub fn reset_password_link(&self, account: &Account) -> String {
        format!("{}/membership/password/reset/{}/{}", self.domain_url, account.id(), account.token)
    }
}

/// The link with its trailing token masked, for info-level logs.
fn masked(link: &str) -> String {
    match link.rsplit_once('/') {
        Some((base, _)) => format!("{}/***", base),
        None => "***".to_string(),
    }
}

#[async_trait]
impl MembershipNotifications for LoggingMembershipNotifications {
    async fn on_sign_up(&self, account: &Account) {
        let link = self.activation_link(account);
        tracing::info!(account = %account, link = %masked(&link), "account signed up");
        tracing::debug!(account = %account, link = %link, "activation link");
    }

    async fn on_activate(&self, account: &Account) {
        tracing::info!(account = %account, "account activated");
    }

    async fn on_new_password(&self, account: &Account) {
        let link = self.reset_password_link(account);
        tracing::info!(account = %account, link = %masked(&link), "account requested a new password");
        tracing::debug!(account = %account, link = %link, "reset password link");
    }

    async fn on_reset_password(&self, account: &Account) {
        tracing::info!(account = %account, "account reset its password");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::fixtures::john_row;
    use crate::domain::account::AccountConversion;
    use crate::resource::Conversion;

    #[test]
    fn links_carry_id_and_token() {
        let account = AccountConversion.instantiate(john_row()).unwrap();
        let notifications = LoggingMembershipNotifications::new("https://example.com/");
        assert_eq!(
            notifications.activation_link(&account),
            format!("https://example.com/membership/activate/{}/john-token", account.id())
        );
        assert!(notifications.reset_password_link(&account).contains("/password/reset/"));
    }

    #[test]
    fn masked_links_hide_the_token() {
        let account = AccountConversion.instantiate(john_row()).unwrap();
        let notifications = LoggingMembershipNotifications::new("https://example.com");
        let link = masked(&notifications.reset_password_link(&account));
        assert!(!link.contains("john-token"));
        assert_eq!(
            link,
            format!("https://example.com/membership/password/reset/{}/***", account.id())
        );
    }
}
