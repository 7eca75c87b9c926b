use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fleeting::{AppState, Config, app};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    tracing::info!("✅ Configuration loaded ({:?} store)", config.store_backend);
    if config.test_mode {
        tracing::warn!("⚠️  TEST_MODE enabled: x-test-now-ms overrides the clock");
    }

    let state = AppState::new(&config).await?;
    tracing::info!("✅ AppState initialized");

    if let Some(interval) = config.prune_interval {
        let store = Arc::clone(state.pastes.store());
        let clock = Arc::clone(&state.clock);
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                match store.prune_inaccessible(clock.now()).await {
                    Ok(removed) => {
                        tracing::info!("🧹 Pruned {} inaccessible pastes", removed);
                    }
                    Err(e) => {
                        tracing::error!("❌ Prune job failed: {}", e);
                    }
                }
            }
        });
        tracing::info!("✅ Prune job started (every {}s)", interval.as_secs());
    }

    let app = app::router(state);

    tracing::info!("🚀 Server listening on http://{}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("👋 Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("❌ Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
