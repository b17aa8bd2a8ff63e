//! iptv-admin
//!
//! Operator console for the IPTV backend API, plus the `/proxy` relay the
//! web player uses to fetch manifests and segments from hosts that refuse
//! cross-origin requests.
//!
//! ```text
//!     Browser ──▶ /proxy?url=… ──▶ ForwardProxy ──▶ Upstream CDN
//!        │
//!        └──────▶ /login, /channels, … ──▶ console ──▶ Backend admin API
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use iptv_admin::config::ConfigWatcher;
use iptv_admin::http::HttpServer;
use iptv_admin::lifecycle::signals::spawn_signal_handler;
use iptv_admin::lifecycle::startup::resolve_config;
use iptv_admin::lifecycle::Shutdown;
use iptv_admin::observability::{logging, metrics};

#[derive(Parser, Debug)]
#[command(name = "iptv-admin", version, about = "IPTV admin console and CORS-bypass proxy")]
struct Args {
    /// TOML configuration file. Watched for changes when given.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = resolve_config(args.config.as_deref(), args.bind.as_deref())?;
    logging::init_logging(&config.observability.log_level);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "iptv-admin starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        console = config.console.enabled,
        api_base_url = %config.console.api_base_url,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    // Keep the watcher alive for the life of the server.
    let (_watcher, config_updates) = match &args.config {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path, &config);
            (Some(watcher.run()?), updates)
        }
        None => {
            let (_, updates) = mpsc::unbounded_channel();
            (None, updates)
        }
    };

    let shutdown = Shutdown::new();
    spawn_signal_handler(shutdown.clone());

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(config)?;
    server.run(listener, config_updates, shutdown.signal()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
