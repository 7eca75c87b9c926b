use std::sync::Arc;

use anyhow::{Context, Result};

use crate::{
    clock::{Clock, SystemClock},
    config::{Config, StoreBackend},
    repositories::{
        memory::MemoryPasteStore, paste_store::PasteStore, postgres::PgPasteStore,
        redis::RedisPasteStore,
    },
    services::pastes::PasteService,
};

/// The application's state.
#[derive(Clone)]
pub struct AppState {
    /// The paste service.
    pub pastes: PasteService,
    /// The application's configuration.
    pub config: Config,
    /// Where request handlers read "now" from.
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Creates a new `AppState`, connecting to the configured store.
    ///
    /// # Arguments
    ///
    /// * `config` - The application's configuration.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `AppState`.
    pub async fn new(config: &Config) -> Result<Self> {
        let store: Arc<dyn PasteStore> = match config.store_backend {
            StoreBackend::Postgres => {
                let url = config
                    .database_url
                    .as_deref()
                    .context("DATABASE_URL must be set")?;
                let pool = crate::db::create_pool(url, config.db_pool_max_size)?;
                crate::db::ensure_schema(&pool).await?;
                tracing::info!("✅ PostgreSQL pool initialized and schema verified");
                Arc::new(PgPasteStore::new(pool))
            }
            StoreBackend::Redis => {
                let store = RedisPasteStore::connect(&config.redis_url)
                    .await
                    .context("Failed to connect to Redis")?;
                tracing::info!("✅ Redis Connection Manager initialized");
                Arc::new(store)
            }
            StoreBackend::Memory => {
                tracing::warn!("⚠️  Using the in-memory store; pastes are lost on restart");
                Arc::new(MemoryPasteStore::new())
            }
        };

        Ok(Self::with_store(config.clone(), store, Arc::new(SystemClock)))
    }

    /// Builds state around an existing store and clock.
    pub fn with_store(config: Config, store: Arc<dyn PasteStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            pastes: PasteService::new(store, config.id_max_attempts),
            config,
            clock,
        }
    }
}
