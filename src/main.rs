use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use groups_injector::config::{load_config, ConfigOverrides, ObservabilityConfig};
use groups_injector::http::HttpServer;
use groups_injector::lifecycle::{spawn_signal_handler, Shutdown};
use groups_injector::observability::{logging, metrics};

/// Identity-enriching reverse proxy.
#[derive(Parser)]
#[command(name = "groups-injector", version, about, long_about = None)]
struct Cli {
    /// Optional TOML configuration file; flags and environment win over it.
    #[arg(short, long, env = "GROUPS_INJECTOR_CONFIG")]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: ConfigOverrides,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref(), &cli.overrides) {
        Ok(config) => config,
        Err(e) => {
            logging::init_logging(&ObservabilityConfig::default());
            tracing::error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };

    logging::init_logging(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        listen = %config.listener.bind_address,
        "Starting groups-injector"
    );
    tracing::info!(upstream = %config.upstream.url, "Upstream");
    tracing::info!(api_url = %config.identity.api_url, "OpenShift API");

    if let Some(addr) = &config.observability.metrics_address {
        let addr: SocketAddr = addr.parse()?;
        metrics::init_metrics(addr);
    }

    let bind_address = config.listener.normalized_address();
    let server = HttpServer::new(config)?;

    let listener = TcpListener::bind(&bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    spawn_signal_handler(shutdown);

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
