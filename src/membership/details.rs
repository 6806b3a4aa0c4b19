use std::fmt;

pub const ROLE_PREFIX: &str = "ROLE_";

/// Authenticated principal: username, stored hash and granted authorities.
#[derive(Clone, PartialEq, Eq)]
pub struct UserDetails {
    pub username: String,
    pub password: String,
    pub authorities: Vec<String>,
}

impl UserDetails {
    /// Authority for a permission id, e.g. `ADMIN` becomes `ROLE_ADMIN`.
    pub fn authority(permission_id: &str) -> String {
        format!("{}{}", ROLE_PREFIX, permission_id)
    }

    pub fn has_authority(&self, authority: &str) -> bool {
        self.authorities.iter().any(|a| a == authority)
    }
}

impl fmt::Debug for UserDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserDetails")
            .field("username", &self.username)
            .field("authorities", &self.authorities)
            .finish_non_exhaustive()
    }
}
