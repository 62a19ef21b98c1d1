//! berkeleyd - Berkeley clock synchronization coordinator.
//!
//! Accepts peers, runs a synchronization cycle on a fixed schedule and keeps
//! going until interrupted.

use std::path::PathBuf;
use std::sync::Arc;

use berkeleyd::clock::LogicalClock;
use berkeleyd::config::{Config, Overrides};
use berkeleyd::coordinator::Coordinator;
use berkeleyd::network::Gateway;
use berkeleyd::telemetry;
use clap::Parser;
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(name = "berkeleyd", version, about = "Berkeley clock synchronization coordinator")]
struct Args {
    /// TOML configuration file; built-in defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen port (keeps the configured address).
    #[arg(short, long)]
    port: Option<u16>,

    /// Seconds between synchronization cycles.
    #[arg(short, long)]
    interval: Option<u64>,

    /// Per-operation I/O timeout in milliseconds.
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Initial offset of the coordinator's clock in milliseconds.
    #[arg(short, long, allow_hyphen_values = true)]
    offset: Option<i64>,

    /// Emit logs as JSON lines.
    #[arg(long)]
    log_json: bool,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            port: self.port,
            interval_secs: self.interval,
            io_timeout_ms: self.timeout,
            initial_offset_ms: self.offset,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    telemetry::init(args.log_json);

    // Load configuration
    let mut config = match &args.config {
        Some(path) => Config::load(path).map_err(|e| {
            error!(path = %path.display(), error = %e, "Failed to load config");
            e
        })?,
        None => Config::default(),
    };
    config.apply(&args.overrides());

    if let Err(errors) = config.validate() {
        for e in &errors {
            error!(error = %e, "Invalid configuration");
        }
        anyhow::bail!("refusing to start with {} configuration error(s)", errors.len());
    }

    let clock = Arc::new(LogicalClock::new(config.clock.initial_offset_ms));
    info!(
        listen = %config.listen.address,
        interval_secs = config.sync.interval_secs,
        io_timeout_ms = config.sync.io_timeout_ms,
        clock = %clock,
        "Starting berkeleyd"
    );

    let coordinator = Arc::new(Coordinator::new(clock));
    let gateway = Gateway::bind(
        config.listen.address,
        Arc::clone(&coordinator),
        config.sync.io_timeout(),
    )
    .await?;

    let scheduler = coordinator.spawn_scheduler(config.sync.schedule());

    tokio::select! {
        result = gateway.run() => {
            if let Err(e) = result {
                error!(error = %e, "Gateway stopped");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupt received; shutting down");
        }
    }

    scheduler.abort();
    coordinator.shutdown().await;
    info!(cycles = coordinator.cycles_run(), "Coordinator stopped");
    Ok(())
}
