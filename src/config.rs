//! Runtime configuration from environment variables (a `.env` file is loaded by the server first).

use crate::error::ConfigError;
use regex::Regex;
use std::fmt;
use std::net::SocketAddr;

pub const DEFAULT_DATABASE_URL: &str = "postgres://localhost/components";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_SCHEMA: &str = "components";
pub const DEFAULT_API_ROOT_PATH: &str = "/api";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    /// Schema holding every components table.
    pub schema: String,
    /// Prefix of every API route, without trailing slash. Empty serves at the root.
    pub api_root_path: String,
    pub bind_addr: SocketAddr,
    pub mail_domain_name: String,
    /// Public base URL used in membership links.
    pub mail_domain_url: String,
    pub static_endpoint: String,
    /// First administrator, created at startup when set.
    pub admin: Option<AdminSeed>,
}

/// Credentials of the administrator the server ensures at startup.
#[derive(Clone, PartialEq, Eq)]
pub struct AdminSeed {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl fmt::Debug for AdminSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminSeed")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

const ADMIN_KEYS: [&str; 3] = [
    "COMPONENTS_ADMIN_USERNAME",
    "COMPONENTS_ADMIN_EMAIL",
    "COMPONENTS_ADMIN_PASSWORD",
];

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            database_url: DEFAULT_DATABASE_URL.into(),
            database_max_connections: DEFAULT_MAX_CONNECTIONS,
            schema: DEFAULT_SCHEMA.into(),
            api_root_path: DEFAULT_API_ROOT_PATH.into(),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            mail_domain_name: "localhost".into(),
            mail_domain_url: "http://localhost:3000".into(),
            static_endpoint: "http://localhost:3000/static".into(),
            admin: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset or blank keys take their default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = AppConfig::default();

        let database_max_connections = match get("DATABASE_MAX_CONNECTIONS") {
            None => defaults.database_max_connections,
            Some(v) => v
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(ConfigError::InvalidValue {
                    key: "DATABASE_MAX_CONNECTIONS",
                    value: v,
                })?,
        };

        let schema = get("COMPONENTS_SCHEMA").unwrap_or(defaults.schema);
        if !is_identifier(&schema) {
            return Err(ConfigError::InvalidIdentifier {
                key: "COMPONENTS_SCHEMA",
                value: schema,
            });
        }

        let api_root_path = match get("API_ROOT_PATH") {
            None => defaults.api_root_path,
            Some(v) if v.starts_with('/') => v.trim_end_matches('/').to_string(),
            Some(v) => {
                return Err(ConfigError::InvalidValue {
                    key: "API_ROOT_PATH",
                    value: v,
                })
            }
        };

        let bind_addr = match get("BIND_ADDR") {
            None => defaults.bind_addr,
            Some(v) => v.parse().map_err(|_| ConfigError::InvalidValue {
                key: "BIND_ADDR",
                value: v.clone(),
            })?,
        };

        // all three admin keys, or none
        let [username, email, password] = ADMIN_KEYS.map(|k| get(k));
        let admin = match (username, email, password) {
            (None, None, None) => None,
            (Some(username), Some(email), Some(password)) => Some(AdminSeed {
                username,
                email,
                password,
            }),
            (username, email, _) => {
                let key = if username.is_none() {
                    ADMIN_KEYS[0]
                } else if email.is_none() {
                    ADMIN_KEYS[1]
                } else {
                    ADMIN_KEYS[2]
                };
                return Err(ConfigError::MissingValue { key });
            }
        };

        Ok(AppConfig {
            database_url: get("DATABASE_URL").unwrap_or(defaults.database_url),
            database_max_connections,
            schema,
            api_root_path,
            bind_addr,
            mail_domain_name: get("MAIL_DOMAIN_NAME").unwrap_or(defaults.mail_domain_name),
            mail_domain_url: get("MAIL_DOMAIN_URL").unwrap_or(defaults.mail_domain_url),
            static_endpoint: get("STATIC_ENDPOINT").unwrap_or(defaults.static_endpoint),
            admin,
        })
    }
}

fn is_identifier(s: &str) -> bool {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}$")
        .map(|re| re.is_match(s))
        .unwrap_or(false)
}
