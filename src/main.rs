//! Service bootstrap binary.
//!
//! ```text
//!   SERVICE / LAUNCH_MODE / CONFIG_PATH
//!              │
//!              ▼
//!        entry::prepare ──(unknown or missing service)──▶ exit 1
//!              │
//!              ▼
//!   config (defaults → TOML → env) ──▶ tracing + metrics
//!              │
//!              ▼
//!   Launcher::{service | application | hybrid}
//!        │            │               │
//!      TCP          HTTP         HTTP + NATS
//!              │
//!              ▼
//!   SIGINT/SIGTERM ──▶ graceful shutdown
//! ```

use std::path::PathBuf;

use clap::Parser;

use service_bootstrap::config::EnvOverlay;
use service_bootstrap::entry::{self, LaunchMode, Selection};
use service_bootstrap::lifecycle::shutdown_signal;
use service_bootstrap::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "service-bootstrap")]
#[command(about = "Run a service over HTTP, point-to-point TCP, or HTTP plus NATS", long_about = None)]
struct Cli {
    /// Service to run (e.g. notification-service)
    #[arg(short, long, env = "SERVICE")]
    service: Option<String>,

    /// Launch mode
    #[arg(short, long, env = "LAUNCH_MODE", value_enum, default_value_t = LaunchMode::Service)]
    mode: LaunchMode,

    /// Optional TOML configuration file
    #[arg(short, long, env = "CONFIG_PATH")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let selection = Selection {
        service: cli.service,
        mode: cli.mode,
        config_path: cli.config,
    };
    let prepared = entry::prepare(&selection, EnvOverlay::new(|var| std::env::var(var).ok()))?;

    let observability = prepared.observability()?;
    logging::init_tracing(&observability);

    tracing::info!(
        service = prepared.kind().id(),
        mode = ?prepared.mode(),
        "service-bootstrap v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    if observability.metrics_enabled {
        match observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let instance = match prepared.launch(None).await {
        Ok(instance) => instance,
        Err(e) => {
            tracing::error!(error = %e, "Launch failed");
            return Err(e.into());
        }
    };
    for listener in instance.listeners() {
        tracing::info!(kind = listener.kind(), listener = ?listener, "Listening");
    }

    shutdown_signal().await;
    instance.shutdown().await;

    tracing::info!("Shutdown complete");
    Ok(())
}
