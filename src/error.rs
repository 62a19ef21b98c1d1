//! Unified error handling for berkeleyd.
//!
//! Every failure in the daemon is scoped to one peer or one cycle. The
//! types here classify those failures for logging; none of them is fatal to
//! the coordinator.

use std::net::SocketAddr;
use std::time::Duration;

use berkeley_proto::{Keyword, ProtocolError};
use thiserror::Error;

// ============================================================================
// Peer Errors (session I/O and protocol)
// ============================================================================

/// Errors raised by a single peer session.
#[derive(Debug, Error)]
pub enum PeerError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(ProtocolError),

    #[error("no response within {0:?}")]
    Timeout(Duration),

    #[error("connection closed by peer")]
    Closed,

    #[error("expected {expected}, got {got}")]
    Unexpected { expected: Keyword, got: Keyword },

    /// The reported delta is so far from the average that the adjustment
    /// cannot be represented.
    #[error("offset {0} is out of range")]
    OffsetOutOfRange(i64),

    /// The peer sent a line nobody asked for.
    #[error("unsolicited input before request")]
    Unsolicited,

    /// The session already failed or was closed; no I/O was attempted.
    #[error("connection is dead")]
    Dead,
}

/// Coarse failure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Read/write failure, timeout or disconnect.
    Transport,
    /// A line that does not fit the current exchange.
    Protocol,
}

impl From<ProtocolError> for PeerError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::Io(io) => PeerError::Io(io),
            other => PeerError::Protocol(other),
        }
    }
}

impl PeerError {
    /// Failure class. Both classes evict the peer.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(_) | Self::Timeout(_) | Self::Closed | Self::Dead => ErrorKind::Transport,
            Self::Protocol(_)
            | Self::Unexpected { .. }
            | Self::Unsolicited
            | Self::OffsetOutOfRange(_) => ErrorKind::Protocol,
        }
    }

    /// Get a static error code string for log labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::Protocol(_) => "protocol",
            Self::Timeout(_) => "timeout",
            Self::Closed => "closed",
            Self::Unexpected { .. } => "unexpected_message",
            Self::Unsolicited => "unsolicited",
            Self::OffsetOutOfRange(_) => "offset_out_of_range",
            Self::Dead => "dead",
        }
    }
}

// ============================================================================
// Handshake Errors
// ============================================================================

/// A connection that never identified itself.
#[derive(Debug, Error)]
#[error("handshake with {addr} failed: {source}")]
pub struct HandshakeError {
    pub addr: SocketAddr,
    #[source]
    pub source: PeerError,
}
