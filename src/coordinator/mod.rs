//! Coordinator - runs the Berkeley synchronization cycle.
//!
//! ```text
//!   Gateway ──register()──▶ PeerSet ◀──snapshot── run_cycle()
//!                                                   │
//!        time_server = clock.now()  ◀───────────────┤
//!        TIME_REQUEST / OFFSET (each peer, in order)│  failures evicted
//!        average = round(Σd / (n + 1))              │
//!        ADJUST average − dᵢ (each peer, in order)  │  failures evicted
//!        clock.adjust(average)      ◀───────────────┘  always last
//! ```
//!
//! The coordinator counts itself as a participant with delta zero. One
//! peer's failure never aborts the cycle and nothing is retried.

mod cycle;
mod peers;
mod schedule;

pub use cycle::{CycleOutcome, CycleReport, adjustment_for, average_with_coordinator};
pub use peers::{PeerEntry, PeerSet};
pub use schedule::Schedule;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{Instrument, info, warn};

use crate::clock::LogicalClock;
use crate::error::PeerError;
use crate::network::{PeerConnection, PeerId};
use crate::telemetry::spans;

/// Owns the peer set and the coordinator's own logical clock.
pub struct Coordinator {
    clock: Arc<LogicalClock>,
    peers: PeerSet,
    cycles: AtomicU64,
}

impl Coordinator {
    pub fn new(clock: Arc<LogicalClock>) -> Self {
        Self {
            clock,
            peers: PeerSet::new(),
            cycles: AtomicU64::new(0),
        }
    }

    pub fn clock(&self) -> &Arc<LogicalClock> {
        &self.clock
    }

    pub fn peers(&self) -> &PeerSet {
        &self.peers
    }

    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    pub fn peer_identities(&self) -> Vec<String> {
        self.peers.identities()
    }

    /// Number of cycles started so far, skipped and aborted ones included.
    pub fn cycles_run(&self) -> u64 {
        self.cycles.load(Ordering::SeqCst)
    }

    /// Add an identified peer; it takes part from the next cycle on.
    pub fn register(&self, conn: PeerConnection) -> PeerId {
        let entry = self.peers.insert(conn);
        info!(peer = %entry, id = %entry.id, peers = self.peers.len(), "Peer registered");
        entry.id
    }

    /// Run one full cycle: poll, average, adjust peers, adjust self.
    pub async fn run_cycle(&self) -> CycleReport {
        let number = self.cycles.fetch_add(1, Ordering::SeqCst) + 1;
        self.cycle(number).instrument(spans::cycle(number)).await
    }

    async fn cycle(&self, number: u64) -> CycleReport {
        let mut report = CycleReport::new(number);

        let snapshot = self.peers.snapshot();
        if snapshot.is_empty() {
            info!("No peers connected; skipping");
            return report;
        }

        let time_server = self.clock.now();
        report.time_server = Some(time_server);
        info!(
            time = %self.clock.pretty_now(),
            offset = self.clock.offset(),
            peers = snapshot.len(),
            "Cycle started; requesting offsets"
        );

        let mut collected: Vec<(&PeerEntry, i64)> = Vec::with_capacity(snapshot.len());
        for entry in snapshot.iter() {
            let polled = entry.conn.lock().await.request_offset(time_server).await;
            match polled {
                Ok(delta) => {
                    info!(peer = %entry, delta, "Offset received");
                    report.deltas.push((entry.identity.clone(), delta));
                    collected.push((entry, delta));
                }
                Err(e) => {
                    self.evict(entry, &e, "poll");
                    report.evicted.push(entry.identity.clone());
                }
            }
        }

        if collected.is_empty() {
            info!("No deltas received; ending cycle");
            report.outcome = CycleOutcome::Aborted;
            return report;
        }

        let deltas: Vec<i64> = collected.iter().map(|(_, delta)| *delta).collect();
        let average = average_with_coordinator(&deltas);
        report.average = Some(average);
        info!(average, participants = deltas.len() + 1, "Average computed (coordinator counted as 0)");

        for (entry, delta) in collected {
            let Some(adjustment) = adjustment_for(average, delta) else {
                entry.conn.lock().await.close();
                let error = PeerError::OffsetOutOfRange(delta);
                self.evict(entry, &error, "adjust");
                report.evicted.push(entry.identity.clone());
                continue;
            };
            let pushed = entry.conn.lock().await.send_adjust(adjustment).await;
            match pushed {
                Ok(()) => {
                    info!(peer = %entry, adjustment, "Adjustment sent");
                    report.adjustments.push((entry.identity.clone(), adjustment));
                }
                Err(e) => {
                    self.evict(entry, &e, "adjust");
                    report.evicted.push(entry.identity.clone());
                }
            }
        }

        self.clock.adjust(average);
        info!(
            adjustment = average,
            time = %self.clock.pretty_now(),
            offset = self.clock.offset(),
            "Coordinator clock adjusted"
        );

        report.outcome = CycleOutcome::Completed;
        report
    }

    fn evict(&self, entry: &PeerEntry, error: &PeerError, stage: &'static str) {
        warn!(
            peer = %entry,
            stage,
            error = %error,
            kind = ?error.kind(),
            code = error.error_code(),
            "Removing peer"
        );
        self.peers.remove(entry.id);
    }

    /// Spawn the periodic cycle task.
    ///
    /// Cycles run one at a time on this task; a cycle that overruns the
    /// interval delays the next tick instead of overlapping it.
    pub fn spawn_scheduler(self: &Arc<Self>, schedule: Schedule) -> tokio::task::JoinHandle<()> {
        let coordinator = Arc::clone(self);
        tokio::spawn(async move { coordinator.run_scheduled(schedule).await })
    }

    async fn run_scheduled(&self, schedule: Schedule) {
        let mut ticker = schedule.ticker();
        loop {
            ticker.tick().await;
            let report = self.run_cycle().await;
            tracing::debug!(cycle = report.number, outcome = %report.outcome, "Cycle finished");
        }
    }

    /// Say `BYE` to every peer, close every session and empty the peer set.
    pub async fn shutdown(&self) {
        let peers = self.peers.drain();
        for entry in peers.iter() {
            entry.conn.lock().await.send_bye().await;
        }
        info!(peers = peers.len(), "All peer sessions closed");
    }
}
