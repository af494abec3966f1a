use anyhow::{Context, Result};
use ipfs_search_web::{
    build_router, crawler::RunningCrawler, create_index, ipfs::IpfsClient, retry::retry, AppState,
    Config,
};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("ipfs_search_web=info,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load_default()?;
    info!(backend = ?config.search.backend, "Starting ipfs-search web");

    let retry_delay = Duration::from_secs(config.retry.delay_secs);

    let index = create_index(&config)?;
    retry(index.name(), config.retry.attempts, retry_delay, || index.ping()).await?;
    info!(backend = index.name(), "Search backend is up");

    let crawler = if config.crawler.enabled {
        let ipfs = IpfsClient::new(&config.ipfs)?;
        let client = &ipfs;
        retry("ipfs", config.retry.attempts, retry_delay, move || async move {
            client.ping().await.map_err(anyhow::Error::from)
        })
        .await?;
        Some(RunningCrawler::spawn(&config.crawler, ipfs, index.clone())?)
    } else {
        None
    };

    let addr = config.bind_addr();
    let app = build_router(AppState::new(config, index)?);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    if let Some(crawler) = crawler {
        crawler.stop().await?;
    }

    info!("Exited");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", err);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
