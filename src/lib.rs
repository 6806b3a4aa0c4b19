//! Components SDK: reusable building blocks for web applications.
//!
//! Generic CRUD and paging over PostgreSQL (`resource`, `sql`), domain resources
//! (`domain`), account membership (`membership`) and the axum HTTP surface (`routes`).

pub mod auth;
pub mod case;
pub mod config;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod membership;
pub mod migration;
pub mod resource;
pub mod response;
pub mod routes;
pub mod sql;
pub mod state;
pub mod validation;

pub use config::{AdminSeed, AppConfig};
pub use error::{AppError, ConfigError};
pub use migration::{apply_migrations, ensure_database_exists};
pub use response::{success_many, success_one, success_page};
pub use routes::{app, common_routes};
pub use state::AppState;
