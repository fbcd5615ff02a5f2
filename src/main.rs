use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tokenfeed::api::{ApiState, create_router};
use tokenfeed::cache;
use tokenfeed::config::AppConfig;
use tokenfeed::core::TokenOrchestrator;
use tokenfeed::core::write_back::DurableWriter;
use tokenfeed::interfaces::durable_store::DurableStore;
use tokenfeed::observability::metrics::register_metrics;
use tokenfeed::observability::tracing::init_tracing;
use tokenfeed::price_infra::aggregator::LiveAggregator;
use tokenfeed::price_infra::connectors::CoinGeckoClient;
use tokenfeed::store::SqliteTokenStore;
use tokenfeed::utils::task_supervisor::TaskSupervisor;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
    let config = AppConfig::load(&env).context("loading configuration")?;

    init_tracing(&config.logging);
    register_metrics();
    tracing::info!("Starting tokenfeed ({})", env);

    let tasks = Arc::new(TaskSupervisor::new());
    let orchestrator = build_orchestrator(&config, Arc::clone(&tasks))?;
    let app = create_router(Arc::new(ApiState {
        orchestrator: Arc::new(orchestrator),
    }));

    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port)
        .parse()
        .context("invalid bind address")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;

    tracing::info!("Listening on http://{}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    // Let in-flight write-backs release their lock before exiting
    if let Err(e) = tasks.wait_idle().await {
        tracing::warn!("Background work failed during shutdown: {}", e);
    }
    tracing::info!("Stopped");
    Ok(())
}

fn build_orchestrator(config: &AppConfig, tasks: Arc<TaskSupervisor>) -> anyhow::Result<TokenOrchestrator> {
    let fast_cache = cache::from_config(&config.cache).context("building fast cache")?;

    let store_url = config.store.url.as_deref().context("store.url is required")?;
    let store: Arc<dyn DurableStore> = Arc::new(
        SqliteTokenStore::open(store_url, config.store.pool_size).context("opening durable store")?,
    );

    let provider = CoinGeckoClient::new(&config.provider).context("building market data client")?;
    tracing::info!("Market data source: {}", provider.source_id());

    let writer = DurableWriter::new(
        Arc::clone(&fast_cache),
        Arc::clone(&store),
        config.write_back.interval(),
        config.cache.lock_ttl(),
    );

    Ok(TokenOrchestrator::new(
        fast_cache,
        store,
        Arc::new(provider),
        LiveAggregator::new(config.provider.ohlc_days),
        writer,
        config.cache.price_ttl(),
        tasks,
    ))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, gracefully stopping");
}
