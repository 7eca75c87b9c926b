use anyhow::{Context, Result};
use deadpool_postgres::{Config, ManagerConfig, Pool, PoolConfig, RecyclingMethod, Runtime};
use std::time::Duration;
use tokio_postgres::NoTls;

/// Idempotent schema for the `pastes` table.
pub const SCHEMA: &str = include_str!("../migrations/0001_create_pastes.sql");

/// Creates a new database connection pool.
///
/// # Arguments
///
/// * `database_url` - The URL of the PostgreSQL database.
/// * `max_size` - The maximum number of pooled connections.
///
/// # Returns
///
/// A `Result` containing the `Pool`.
pub fn create_pool(database_url: &str, max_size: usize) -> Result<Pool> {
    // Parse up front so a malformed URL fails at startup, not on first query.
    database_url
        .parse::<tokio_postgres::Config>()
        .context("DATABASE_URL is not a valid PostgreSQL connection string")?;

    let mut cfg = Config::new();
    cfg.url = Some(database_url.to_string());

    cfg.manager = Some(ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    });

    cfg.pool = Some(PoolConfig {
        max_size,
        timeouts: deadpool_postgres::Timeouts {
            wait: Some(Duration::from_secs(5)),
            create: Some(Duration::from_secs(2)),
            recycle: Some(Duration::from_secs(1)),
        },
        ..Default::default()
    });

    cfg.create_pool(Some(Runtime::Tokio1), NoTls)
        .context("Failed to create PostgreSQL pool")
}

/// Applies the paste schema. Safe to run on every startup.
pub async fn ensure_schema(pool: &Pool) -> Result<()> {
    let client = pool
        .get()
        .await
        .context("Failed to get a database connection")?;

    client
        .batch_execute(SCHEMA)
        .await
        .context("Failed to apply paste schema")?;

    Ok(())
}
