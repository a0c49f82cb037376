use clap::Parser;
use std::process;

use dockyard_cli::{config::parse_port, init_tracing, run_server, Config};

#[derive(Parser)]
#[command(name = "dockyard")]
#[command(about = "Dockyard - container provisioning over HTTP")]
#[command(version)]
struct Cli {
    /// Address to bind (overrides DOCKYARD_HOST)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides DOCKYARD_PORT)
    #[arg(long, value_parser = |s: &str| parse_port(s).map_err(|e| e.to_string()))]
    port: Option<u16>,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    let mut config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            process::exit(1);
        }
    };

    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }

    if let Err(e) = run_server(config).await {
        tracing::error!("Server error: {:#}", e);
        process::exit(1);
    }
}
