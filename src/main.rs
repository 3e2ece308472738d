//! CDN reverse proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ─────────────▶ http server ──▶ site endpoints (/, /favicon.ico, /list, /logs)
//!                         │
//!                         ▼
//!                    routing (prefix match, sanitize, resolve)
//!                         │
//!              ┌──────────┼────────────┐
//!              ▼          ▼            ▼
//!          raw=true    cache hit    forward ──▶ Origin
//!          302         (memory)        │
//!                                      ▼
//!                              admit into cache (2xx, listed type, >= min_size)
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use cdn_proxy::config::load_config;
use cdn_proxy::http::HttpServer;
use cdn_proxy::lifecycle::{signals, startup, Shutdown};
use cdn_proxy::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "cdn-proxy", version, about = "Config-driven CDN reverse proxy")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "cdn-proxy.toml")]
    config: PathBuf,

    /// Start with built-in defaults when the config file cannot be loaded.
    #[arg(long)]
    fallback_default_config: bool,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let loaded = load_config(&cli.config);
    let level = loaded
        .as_ref()
        .map(|c| c.observability.log_level.clone())
        .unwrap_or_else(|_| "info".to_string());
    logging::init_tracing(&level);

    let mut config =
        startup::resolve_startup_config(&cli.config, loaded, cli.fallback_default_config)?;
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let server = HttpServer::new(config)?;
    startup::log_startup_banner(&server);

    let listener = TcpListener::bind(&server.config().listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let stop = shutdown.subscribe();
    signals::spawn_signal_handler(shutdown);

    server.run(listener, stop).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
