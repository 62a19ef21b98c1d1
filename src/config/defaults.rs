//! Default value functions for configuration.
//!
//! Separated into its own module for clarity and reuse.

use std::net::{Ipv4Addr, SocketAddr};

// =============================================================================
// Listen Defaults
// =============================================================================

pub const DEFAULT_PORT: u16 = 5000;

pub fn default_listen_address() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT))
}

// =============================================================================
// Sync Defaults
// =============================================================================

pub fn default_interval_secs() -> u64 {
    10
}

pub fn default_initial_delay_secs() -> u64 {
    3
}

pub fn default_io_timeout_ms() -> u64 {
    4000
}
