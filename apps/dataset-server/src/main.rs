use anyhow::{Context, Result};
use clap::Parser;
use dataset_sdk::InMemoryDatasetService;
use dataset_server::config::{Cli, ServerConfig};
use dataset_server::routes;
use dataset_server::seed;
use dataset_server::state::AppState;
use dataset_server::telemetry::init_tracing;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServerConfig::try_from(Cli::parse())?;
    init_tracing(&config.log_filter);

    let records = seed::generate_records(config.seed_records, &mut rand::thread_rng());
    let dataset = InMemoryDatasetService::new(records);
    let state = AppState::new(dataset, config.seed_records);

    let app = routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    info!(
        addr = %config.listen_addr,
        seed_records = config.seed_records,
        "starting dataset-server"
    );
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server shutdown with error")?;
    info!("dataset-server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let _ = signal::ctrl_c().await;
}
