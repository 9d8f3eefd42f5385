//! Locale & Experiment Routing Edge Service
//!
//! Sits in front of a CMS-rendered site and routes every page request to its
//! localized (and, for experiment pages, variant) route on the origin.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────────┐
//!                         │                   LOCALE EDGE                    │
//!     Client Request      │  ┌─────────┐    ┌────────────┐    ┌──────────┐   │
//!     ────────────────────┼─▶│  http   │───▶│  routing   │───▶│ rewrite  │───┼──▶ Origin
//!                         │  │ server  │    │ middleware │    │ → proxy  │   │
//!                         │  └─────────┘    └─────┬──────┘    └──────────┘   │
//!                         │                       │ redirect (307)           │
//!     Client Response     │                       ▼                          │
//!     ◀───────────────────┼──────────── cookies + X-Locale ◀─────────────────┤
//!                         │                                                  │
//!                         │  ┌────────────────────────────────────────────┐  │
//!                         │  │ experiments: flags (bounded), datafile,    │  │
//!                         │  │ webhook signature, event tracking          │  │
//!                         │  └────────────────────────────────────────────┘  │
//!                         └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use locale_edge::config::loader::{load_config, load_from_env};
use locale_edge::http::EdgeServer;
use locale_edge::lifecycle::{shutdown_signal, Shutdown};
use locale_edge::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "locale-edge")]
#[command(about = "Locale & experiment routing edge service", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file. Defaults plus environment when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path),
        None => load_from_env(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    logging::init_logging(&config.observability);
    tracing::info!("locale-edge v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        origin = %config.origin.address,
        locales = ?config.locales.supported,
        default_locale = %config.locales.default,
        experiment_pages = config.experiments.pages.len(),
        flags_enabled = config.flags.enabled,
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

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = EdgeServer::new(config)?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        shutdown_signal(&shutdown).await;
    });

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
