use anyhow::Context;
use farewatch_api::{app, AppState};
use farewatch_core::AuthenticatedSource;
use farewatch_infra::{AmadeusApi, Config};
use farewatch_search::SearchOrchestrator;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "farewatch_api=debug,farewatch_search=debug,farewatch_offer=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Farewatch API on port {}", config.server.port);

    let api = AmadeusApi::new(&config.source).context("Failed to build HTTP client")?;
    let source = Arc::new(AuthenticatedSource::new(api, config.source.retry_policy()));
    let orchestrator = SearchOrchestrator::new(source, config.trend.trend_config());

    let app = app(AppState::new(orchestrator));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
