// ABOUTME: Server wiring for the dockyard binary
// ABOUTME: Builds the runtime gateway and app state from config, then serves the router

use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

pub mod config;

#[cfg(test)]
mod tests;

pub use config::{Config, ConfigError};

use dockyard_api::{create_router, AppState};
use dockyard_provisioning::ProvisionSettings;
use dockyard_runtime::{DockerCli, DockerConnector, Gateway, RuntimeError};

/// Install the global tracing subscriber; `RUST_LOG` overrides the `info` default
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();
}

pub fn provision_settings(config: &Config) -> ProvisionSettings {
    ProvisionSettings {
        default_image: config.default_image.clone(),
        reserved_ports: config.reserved_ports(),
    }
}

/// Handler state over the local Docker daemon
pub fn build_state(config: &Config) -> Result<AppState, RuntimeError> {
    let connector = DockerConnector::new(config.pull_timeout, config.pool_connections)?;
    let gateway = Gateway::new(Arc::new(connector));

    Ok(AppState::new(gateway, provision_settings(config))
        .with_docker_cli(DockerCli::new(config.docker_bin.clone()))
        .with_stop_timeout(config.stop_timeout_secs))
}

pub async fn run_server(config: Config) -> anyhow::Result<()> {
    let state = build_state(&config)?;

    // Startup check only; every request checks the daemon again
    match state.gateway.acquire().await {
        Ok(_) => info!("Docker daemon reachable"),
        Err(e) => warn!("Docker daemon not reachable yet: {}", e),
    }

    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!(
        "Dockyard listening on {} (default image {}, reserved ports {:?})",
        addr,
        config.default_image,
        config.reserved_ports()
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Dockyard stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
