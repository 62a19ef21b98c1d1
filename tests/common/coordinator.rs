//! Test coordinator.
//!
//! Runs a [`Coordinator`] and its [`Gateway`] inside the test runtime. Cycles
//! are never scheduled; tests call [`Coordinator::run_cycle`] themselves.

use berkeleyd::clock::{LogicalClock, ManualTimeSource};
use berkeleyd::coordinator::Coordinator;
use berkeleyd::network::Gateway;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep};

/// Reference instant every test clock starts from.
pub const REFERENCE_MILLIS: i64 = 1_700_000_000_000;

/// Handshake, poll and adjust timeout used by test coordinators.
pub const IO_TIMEOUT: Duration = Duration::from_millis(500);

/// A coordinator listening on 127.0.0.1 with a manually driven clock.
pub struct TestCoordinator {
    pub coordinator: Arc<Coordinator>,
    pub source: Arc<ManualTimeSource>,
    addr: SocketAddr,
    gateway: JoinHandle<anyhow::Result<()>>,
}

impl TestCoordinator {
    /// Start a coordinator whose clock begins `offset` ms from the reference.
    pub async fn spawn(offset: i64) -> anyhow::Result<Self> {
        let source = Arc::new(ManualTimeSource::new(REFERENCE_MILLIS));
        let clock = Arc::new(LogicalClock::with_source(source.clone(), offset));
        let coordinator = Arc::new(Coordinator::new(clock));

        let gateway = Gateway::bind(
            "127.0.0.1:0".parse()?,
            Arc::clone(&coordinator),
            IO_TIMEOUT,
        )
        .await?;
        let addr = gateway.local_addr()?;
        let gateway = tokio::spawn(gateway.run());

        Ok(Self {
            coordinator,
            source,
            addr,
            gateway,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Wait until exactly `count` peers are registered.
    pub async fn wait_for_peers(&self, count: usize) -> anyhow::Result<()> {
        let deadline = Instant::now() + Duration::from_secs(5);
        while self.coordinator.peer_count() != count {
            if Instant::now() >= deadline {
                anyhow::bail!(
                    "expected {count} peers, have {}",
                    self.coordinator.peer_count()
                );
            }
            sleep(Duration::from_millis(10)).await;
        }
        Ok(())
    }
}

impl Drop for TestCoordinator {
    fn drop(&mut self) {
        self.gateway.abort();
    }
}
