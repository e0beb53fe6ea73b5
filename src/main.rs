// dongju-gateway - Personal color & face shape analysis gateway
// Author: kelexine (https://github.com/kelexine)

use anyhow::Result;
use clap::Parser;
use dongju_gateway::cli::Args;
use dongju_gateway::config::AppConfig;
use dongju_gateway::server::create_router;
use dongju_gateway::upstream::AnalysisClient;
use dongju_gateway::utils::logging;
use std::net::SocketAddr;
use tokio::signal;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Phase 1: Load configuration, flags last
    let mut config = AppConfig::load(args.config.as_deref())?;
    args.apply(&mut config);
    config.validate()?;

    // Phase 2: Initialize logging
    logging::init(&config.logging)?;
    info!("Starting dongju-gateway v{}", env!("CARGO_PKG_VERSION"));

    // Phase 3: Build the upstream client
    let client = AnalysisClient::new(&config.upstream)?;
    info!(
        "Relaying to {} (connect {}ms, read {}ms, file {}ms)",
        config.upstream.base_url,
        config.upstream.connect_timeout_ms,
        config.upstream.read_timeout_ms,
        config.upstream.file_timeout_ms
    );

    // Phase 4: Build and start HTTP server
    let app = create_router(config.clone(), client)?;
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Phase 5: Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
