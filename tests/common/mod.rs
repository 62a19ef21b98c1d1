//! Integration test common infrastructure.
//!
//! Provides an in-process coordinator bound to an ephemeral port and a raw
//! line-level peer for driving the protocol by hand.

pub mod coordinator;
pub mod peer;

#[allow(unused_imports)]
pub use coordinator::TestCoordinator;
#[allow(unused_imports)]
pub use peer::TestPeer;
