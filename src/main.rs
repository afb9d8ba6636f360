//! Stock data gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http (axum router, request id, RequestContext)
//!                          │
//!                          ▼
//!                     stocks::StockService ──▶ cache (profile / aggregate TTL)
//!                          │
//!                          ▼
//!                     fanout (dispatch → collect → aggregate)
//!                          │   bounded by max_parallelism
//!                          ▼
//!                     upstream::PolygonClient ──────────────▶ Polygon REST API
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

use stock_gateway::config::{load_config, load_layered, GatewayConfig};
use stock_gateway::favourites::InMemoryFavourites;
use stock_gateway::observability::{logging, metrics};
use stock_gateway::upstream::PolygonClient;
use stock_gateway::{HttpServer, StockService};

#[derive(Parser)]
#[command(name = "stock-gateway")]
#[command(about = "Concurrent stock data gateway in front of Polygon", long_about = None)]
struct Args {
    /// Directory holding config.toml and config.<env>.toml
    #[arg(long, default_value = "config")]
    config_dir: PathBuf,

    /// Environment overlay to apply on top of config.toml
    #[arg(long, default_value = "development")]
    env: String,

    /// Load a single config file instead of the layered directory
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config: GatewayConfig = match &args.config {
        Some(path) => load_config(path)?,
        None => load_layered(&args.config_dir, &args.env)?,
    };

    logging::init_logging(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        env = %args.env,
        "stock-gateway starting"
    );
    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_parallelism = config.fanout.max_parallelism,
        request_timeout_secs = config.timeouts.request_secs,
        upstream_timeout_secs = config.timeouts.upstream_secs,
        "Configuration loaded"
    );
    tracing::debug!(polygon = ?config.polygon, "Upstream provider");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let client = PolygonClient::new(&config.polygon.base_url, config.polygon.api_key.clone())?;
    let service = Arc::new(StockService::from_config(
        &config,
        Arc::new(client),
        Arc::new(InMemoryFavourites::new()),
    ));

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    HttpServer::new(service, &config).run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
