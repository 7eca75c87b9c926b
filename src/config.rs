use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};

/// Default number of identifiers tried before a create gives up.
pub const DEFAULT_ID_MAX_ATTEMPTS: usize = 5;

/// Which `PasteStore` implementation backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Redis,
    Memory,
}

impl StoreBackend {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Some(StoreBackend::Postgres),
            "redis" => Some(StoreBackend::Redis),
            "memory" => Some(StoreBackend::Memory),
            _ => None,
        }
    }
}

/// The application's configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// The address the HTTP server binds to.
    pub bind_addr: SocketAddr,
    /// The storage backend.
    pub store_backend: StoreBackend,
    /// The URL of the PostgreSQL database.
    pub database_url: Option<String>,
    /// Maximum number of pooled PostgreSQL connections.
    pub db_pool_max_size: usize,
    /// The URL of the Redis server.
    pub redis_url: String,
    /// Base used for share links when the request carries no `Origin`.
    pub public_base_url: Option<String>,
    /// Whether the `x-test-now-ms` clock override is honoured.
    pub test_mode: bool,
    /// How many identifiers a create tries before failing.
    pub id_max_attempts: usize,
    /// Interval of the pruning job, disabled when `None`.
    pub prune_interval: Option<Duration>,
}

/// Parses a boolean-like environment value.
///
/// Accepts `1/true/yes/on` and `0/false/no/off` (and the empty string),
/// case-insensitively. Anything else yields `None`.
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "" | "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Config {
    /// Creates a new `Config` from environment variables.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `Config`.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Builds a `Config` from an arbitrary variable lookup.
    ///
    /// # Arguments
    ///
    /// * `var` - Returns the value of a variable, or `None` when unset.
    pub fn from_vars<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_addr = var("BIND_ADDR")
            .unwrap_or_else(|| "127.0.0.1:3000".to_string())
            .parse()
            .context("Invalid BIND_ADDR")?;

        let store_backend = match var("STORE_BACKEND") {
            Some(raw) => StoreBackend::parse(&raw).with_context(|| {
                format!("Invalid STORE_BACKEND '{raw}' (expected postgres, redis or memory)")
            })?,
            None => StoreBackend::Postgres,
        };

        let database_url = var("DATABASE_URL").filter(|url| !url.trim().is_empty());
        if store_backend == StoreBackend::Postgres && database_url.is_none() {
            anyhow::bail!("DATABASE_URL must be set when STORE_BACKEND is postgres");
        }

        let db_pool_max_size = var("DB_POOL_MAX_SIZE")
            .unwrap_or_else(|| "16".to_string())
            .parse()
            .context("Invalid DB_POOL_MAX_SIZE")?;

        let test_flag = match var("TEST_MODE") {
            Some(raw) => parse_flag(&raw).with_context(|| format!("Invalid TEST_MODE '{raw}'"))?,
            None => false,
        };
        let is_production = var("APP_ENV").is_some_and(|env| env.trim() == "production");
        if test_flag && is_production {
            tracing::warn!("⚠️  TEST_MODE ignored because APP_ENV is production");
        }

        let id_max_attempts: usize = var("ID_MAX_ATTEMPTS")
            .map(|raw| raw.parse().context("Invalid ID_MAX_ATTEMPTS"))
            .transpose()?
            .unwrap_or(DEFAULT_ID_MAX_ATTEMPTS);
        if id_max_attempts == 0 {
            anyhow::bail!("ID_MAX_ATTEMPTS must be at least 1");
        }

        let prune_interval = var("PRUNE_INTERVAL_SECS")
            .map(|raw| raw.parse::<u64>().context("Invalid PRUNE_INTERVAL_SECS"))
            .transpose()?
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        Ok(Self {
            bind_addr,
            store_backend,
            database_url,
            db_pool_max_size,
            redis_url: var("REDIS_URL").unwrap_or_else(|| "redis://127.0.0.1:6379".to_string()),
            public_base_url: var("PUBLIC_BASE_URL")
                .map(|url| url.trim().trim_end_matches('/').to_string())
                .filter(|url| !url.is_empty()),
            test_mode: test_flag && !is_production,
            id_max_attempts,
            prune_interval,
        })
    }

    /// A configuration for an in-memory store, used by tests and local runs.
    pub fn in_memory(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            store_backend: StoreBackend::Memory,
            database_url: None,
            db_pool_max_size: 1,
            redis_url: "redis://127.0.0.1:6379".to_string(),
            public_base_url: None,
            test_mode: false,
            id_max_attempts: DEFAULT_ID_MAX_ATTEMPTS,
            prune_interval: None,
        }
    }
}
