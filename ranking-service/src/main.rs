use anyhow::Context;
use ranking_service::{build_router, AppState, RankingService, RedisRankingStore};
use shared::config::{RankingConfig, RedisConfig, ServiceConfig};
use std::sync::Arc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let service_config = ServiceConfig::from_env("ranking-service", 8080)?;

    shared::init_tracing(&service_config.name)
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;

    if service_config.metrics_enabled {
        shared::init_metrics(service_config.metrics_port)
            .map_err(|e| anyhow::anyhow!("Failed to initialize metrics: {}", e))?;
    }

    info!("Starting {}", service_config.name);

    let redis_config = RedisConfig::from_env()?;
    let ranking_config = RankingConfig::from_env()?;

    info!("Configuration:");
    info!("  Redis DSN: {}", redis_config.redacted_url());
    info!("  HTTP Port: {}", service_config.port);
    info!("  Default limit: {}", ranking_config.default_limit);
    info!("  Max limit: {}", ranking_config.max_limit);
    info!("  Metadata concurrency: {}", ranking_config.metadata_concurrency);

    let store = RedisRankingStore::new(&redis_config)?;

    // Startup continues without Redis; the health probe does not depend on it.
    match store.ping().await {
        Ok(()) => info!("Redis reachable"),
        Err(e) => warn!("Redis not reachable at startup: {}", e),
    }

    let rankings = RankingService::new(Arc::new(store), ranking_config);
    let app = build_router(AppState::new(rankings, service_config.name.as_str()));

    let addr = format!("0.0.0.0:{}", service_config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for ctrl-c: {}", e);
            }
            info!("Shutdown signal received");
        })
        .await
        .context("HTTP server error")?;

    shared::shutdown().await;
    info!("{} stopped", service_config.name);
    Ok(())
}
