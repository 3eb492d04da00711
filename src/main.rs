//! Image proxy server.
//!
//! Serves `<path>?url=<relative path>` by fetching `<origin>/<relative path>`
//! and relaying the bytes with an immutable cache directive.

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use image_proxy::lifecycle::{resolve_config, signals, startup, Overrides, Shutdown};
use image_proxy::observability::{logging, metrics};
use image_proxy::HttpServer;

#[derive(Parser, Debug)]
#[command(name = "image-proxy")]
#[command(about = "Forward image requests to a fixed upstream origin", long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "IMAGE_PROXY_CONFIG")]
    config: Option<PathBuf>,

    /// Upstream origin, e.g. http://images.internal:9000
    #[arg(long)]
    origin: Option<String>,

    /// Listen address, e.g. 0.0.0.0:8080
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let overrides = Overrides {
        origin: args.origin,
        bind_address: args.bind,
    };
    let config = resolve_config(args.config.as_deref(), &overrides)?;

    logging::init(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "image-proxy starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        origin = %config.upstream.origin,
        path = %config.forwarder.path,
        request_timeout_secs = config.timeouts.request_secs,
        upstream_timeout_secs = config.upstream.request_timeout_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        metrics::init_metrics(config.observability.metrics_address.parse()?)?;
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = HttpServer::new(config)?;
    startup::spawn_warm_up(server.readiness());

    let shutdown = Shutdown::new();
    let drain = shutdown.subscribe();
    tokio::spawn(signals::trigger_on_signal(shutdown));

    server.run(listener, drain).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
