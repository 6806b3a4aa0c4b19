//! Schema DDL generated from the table descriptors, and database bootstrap.
//! Tables are created in dependency order; every statement is idempotent.

use crate::error::AppError;
use crate::sql::{qualified_table, quoted, SqlType, Table};
use sqlx::{ConnectOptions, PgPool};
use std::str::FromStr;

/// CREATE SCHEMA, then for each table CREATE TABLE and its unique indexes.
pub fn ddl_statements(schema: &str, tables: &[&Table]) -> Vec<String> {
    let mut statements = vec![format!("CREATE SCHEMA IF NOT EXISTS {}", quoted(schema))];
    for table in tables {
        statements.push(create_table(schema, table));
        statements.extend(unique_indexes(schema, table));
    }
    statements
}

fn create_table(schema: &str, table: &Table) -> String {
    let mut defs: Vec<String> = table
        .columns
        .iter()
        .map(|c| {
            let mut def = format!("{} {}", quoted(c.name), c.sql_type.pg_name().to_uppercase());
            if !c.nullable {
                def.push_str(" NOT NULL");
            }
            if let Some(parent) = c.references {
                def.push_str(&format!(
                    " REFERENCES {} ON DELETE CASCADE",
                    qualified_table(schema, parent)
                ));
            }
            def
        })
        .collect();
    defs.push(format!("PRIMARY KEY ({})", quoted(table.id_column)));
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n  {}\n)",
        qualified_table(schema, table.name),
        defs.join(",\n  ")
    )
}

/// Unique text columns are unique case-insensitively, matching the case-insensitive lookups.
fn unique_indexes(schema: &str, table: &Table) -> Vec<String> {
    table
        .columns
        .iter()
        .filter(|c| c.unique)
        .map(|c| {
            let target = match c.sql_type {
                SqlType::Text => format!("LOWER({})", quoted(c.name)),
                _ => quoted(c.name),
            };
            format!(
                "CREATE UNIQUE INDEX IF NOT EXISTS {} ON {} ({})",
                quoted(&format!("{}_{}_key", table.name, c.name)),
                qualified_table(schema, table.name),
                target
            )
        })
        .collect()
}

pub async fn apply_migrations(pool: &PgPool, schema: &str, tables: &[&Table]) -> Result<(), AppError> {
    for statement in ddl_statements(schema, tables) {
        tracing::debug!(sql = %statement, "migration");
        sqlx::query(&statement).execute(pool).await?;
    }
    tracing::info!(schema, tables = tables.len(), "schema up to date");
    Ok(())
}

/// Ensure the database in `database_url` exists; create it if not. Connects to the
/// default `postgres` database to run CREATE DATABASE. Call before creating the main pool.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), AppError> {
    let (admin_url, db_name) = split_database_name(database_url)?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = sqlx::postgres::PgConnectOptions::from_str(&admin_url)
        .map_err(|e| AppError::Internal(format!("invalid DATABASE_URL: {}", e)))?;
    let mut conn: sqlx::PgConnection = opts.connect().await?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists.0 {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", quoted(&db_name)))
            .execute(&mut conn)
            .await?;
    }
    Ok(())
}

/// Split a database URL into the admin (`postgres` database) URL and the database name.
fn split_database_name(url: &str) -> Result<(String, String), AppError> {
    let path_start = url
        .rfind('/')
        .ok_or_else(|| AppError::Internal("DATABASE_URL: no path".into()))?
        + 1;
    let path_and_query = url.get(path_start..).unwrap_or("");
    let db_name = path_and_query.split('?').next().unwrap_or("").trim();
    let base = url.get(..path_start).unwrap_or(url);
    Ok((format!("{}postgres", base), db_name.to_string()))
}
