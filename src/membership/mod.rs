//! Account membership: sign-up, activation, password renewal, user details.

mod details;
mod encryption;
mod notifications;
mod request;
mod service;

pub use details::{UserDetails, ROLE_PREFIX};
pub use encryption::{hash_password, new_token, verify_password, AccountEncryption};
pub use notifications::{LoggingMembershipNotifications, MembershipNotifications};
pub use request::SignUpRequest;
pub use service::MembershipService;
