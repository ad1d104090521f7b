use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

/// DDL for all application tables, applied idempotently on startup.
pub const SCHEMA: &str = include_str!("../migrations/001_schema.sql");

const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(3);
const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(300);
const DEFAULT_MAX_LIFETIME: Duration = Duration::from_secs(1800);

/// Builds a Postgres pool with fail-fast acquire behavior and bounded
/// connection lifetimes.
pub async fn get_pool(url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(DEFAULT_ACQUIRE_TIMEOUT)
        .test_before_acquire(true)
        .idle_timeout(DEFAULT_IDLE_TIMEOUT)
        .max_lifetime(DEFAULT_MAX_LIFETIME)
        .connect(url)
        .await
}

/// Applies the embedded schema. Every statement is idempotent, so this runs
/// on every startup and on every seed invocation.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    info!("applying schema migrations");
    sqlx::raw_sql(SCHEMA).execute(pool).await?;
    Ok(())
}
