//! Components server: configuration from the environment, PostgreSQL, migrations, HTTP.
//!
//! Run from repo root: `cargo run -p components-server`

use components_sdk::{app, apply_migrations, domain::TABLES, ensure_database_exists, AppConfig, AppState};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("components_sdk=info,tower_http=info")),
        )
        .init();

    let config = AppConfig::from_env()?;
    ensure_database_exists(&config.database_url).await?;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;
    apply_migrations(&pool, &config.schema, TABLES).await?;

    let bind_addr = config.bind_addr;
    let api_root = config.api_root_path.clone();
    let state = AppState::postgres(pool, config);
    if let Some(seed) = state.config.admin.clone() {
        state.membership.ensure_admin(&seed).await?;
    }
    let router = app(state);

    let listener = TcpListener::bind(bind_addr).await?;
    tracing::info!("components server listening on http://{} (api at '{}')", listener.local_addr()?, api_root);
    axum::serve(listener, router).await?;
    Ok(())
}
