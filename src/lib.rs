//! berkeleyd - Berkeley-style clock synchronization.
//!
//! A coordinator accepts peers over TCP, periodically polls each one for its
//! clock offset, averages the offsets with itself counted as a zero-offset
//! participant, and tells every peer (and finally itself) how far to move.
//!
//! The library is split the way the daemon runs:
//! - [`network`]: listener and per-peer sessions
//! - [`coordinator`]: peer set, cycle arithmetic, scheduler
//! - [`agent`]: the peer side of the protocol
//! - [`clock`]: logical clocks and reference time sources

pub mod agent;
pub mod clock;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod network;
pub mod telemetry;

pub use agent::{AgentExit, PeerAgent};
pub use clock::{LogicalClock, ManualTimeSource, SystemTimeSource, TimeSource};
pub use config::Config;
pub use coordinator::{Coordinator, CycleOutcome, CycleReport, Schedule};
pub use error::{HandshakeError, PeerError};
pub use network::Gateway;
