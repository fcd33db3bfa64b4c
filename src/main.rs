//! DevFest GitOps demo service.
//!
//! ```text
//!     Client Request
//!     ─────────────────▶ TraceLayer ─▶ request ID ─▶ timeout ─▶ metrics ─▶ GET /        (greeting)
//!                                                                        ─▶ GET /metrics (scrape)
//!
//!     config file ─▶ ConfigWatcher ─▶ greeting swap
//!     SIGINT/SIGTERM ─▶ Shutdown ─▶ graceful drain
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use hello_gitops::config::{load_config, ConfigWatcher, ServiceConfig};
use hello_gitops::lifecycle::{wait_for_signal, Shutdown};
use hello_gitops::observability::logging;
use hello_gitops::HttpServer;

#[derive(Parser, Debug)]
#[command(name = "hello-gitops")]
#[command(about = "Hello world service with Prometheus metrics", version)]
struct Cli {
    /// TOML configuration file. Built-in defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };

    logging::init_logging(&config.observability.log_level);

    tracing::info!("hello-gitops v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        version = %config.greeting.version,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    // The watcher handle must outlive the server for reloads to keep flowing.
    let (_watcher, config_updates) = match &cli.config {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (Some(watcher.run()?), updates)
        }
        None => {
            let (_, updates) = mpsc::unbounded_channel();
            (None, updates)
        }
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        wait_for_signal().await;
        shutdown.trigger();
    });

    let server = HttpServer::new(config)?;
    server.run(listener, config_updates, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
