//! berkeley-peer - peer agent for a berkeleyd coordinator.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use berkeleyd::agent::{AgentExit, PeerAgent};
use berkeleyd::clock::LogicalClock;
use berkeleyd::telemetry;
use clap::Parser;
use rand::Rng;
use tokio::net::lookup_host;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "berkeley-peer", version, about = "Peer agent for berkeleyd")]
struct Args {
    /// Coordinator host.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Coordinator port.
    #[arg(short, long, default_value_t = 5000)]
    port: u16,

    /// Identity announced in HELLO (random `cli-N` when omitted).
    #[arg(long)]
    id: Option<String>,

    /// Initial clock offset in milliseconds (random in [-1000, 1000) when omitted).
    #[arg(short, long, allow_hyphen_values = true)]
    offset: Option<i64>,

    /// Emit logs as JSON lines.
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    telemetry::init(args.log_json);

    let (identity, offset) = {
        let mut rng = rand::thread_rng();
        let identity = args
            .id
            .unwrap_or_else(|| format!("cli-{}", rng.gen_range(0..1000)));
        let offset = args.offset.unwrap_or_else(|| rng.gen_range(-1000..1000));
        (identity, offset)
    };

    let addr: SocketAddr = lookup_host((args.host.as_str(), args.port))
        .await?
        .next()
        .with_context(|| format!("could not resolve {}", args.host))?;

    let clock = Arc::new(LogicalClock::new(offset));
    info!(id = %identity, %addr, clock = %clock, "Connecting to coordinator");

    let agent = PeerAgent::new(identity, clock);
    let transport = PeerAgent::connect(addr)
        .await
        .with_context(|| format!("could not connect to {addr}"))?;

    match agent.run(transport).await? {
        AgentExit::Bye => info!("Session ended by coordinator"),
        AgentExit::Disconnected => info!("Coordinator went away"),
    }
    Ok(())
}
