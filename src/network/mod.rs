//! Network module.
//!
//! Contains the Gateway (TCP acceptor) and the per-peer session types.

mod gateway;
pub mod peer;

pub use gateway::Gateway;
pub use peer::{PeerConnection, PeerId, PeerState, PendingPeer};
