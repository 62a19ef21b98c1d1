//! One peer's session with the coordinator.
//!
//! ```text
//! PendingPeer ──handshake()──▶ PeerConnection (Identified) ──I/O failure / close()──▶ Dead
//!      │
//!      └── malformed / missing HELLO ──▶ dropped, never registered
//! ```
//!
//! Only an identified [`PeerConnection`] exposes polling, so an offset request
//! before the handshake cannot be expressed. Any failure during polling or
//! adjustment closes the session for good.

use std::fmt;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use berkeley_proto::{Keyword, Message, Transport};
use tokio::net::TcpStream;
use tracing::{debug, instrument};

use crate::error::{HandshakeError, PeerError};

/// Identity shown for a connection that has not said `HELLO` yet.
pub const UNIDENTIFIED: &str = "unknown";

static NEXT_PEER_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique handle for an accepted connection.
///
/// Identities come from the remote side and may collide; the id does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerId(u64);

impl PeerId {
    pub fn next() -> Self {
        Self(NEXT_PEER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle of an identified session. Before `HELLO` a connection is a
/// [`PendingPeer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerState {
    Identified,
    Dead,
}

async fn with_timeout<T, E>(
    limit: Duration,
    fut: impl Future<Output = Result<T, E>>,
) -> Result<T, PeerError>
where
    PeerError: From<E>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result.map_err(PeerError::from),
        Err(_) => Err(PeerError::Timeout(limit)),
    }
}

/// An accepted connection waiting for its `HELLO`.
pub struct PendingPeer {
    id: PeerId,
    addr: SocketAddr,
    transport: Transport,
    io_timeout: Duration,
}

impl PendingPeer {
    pub fn new(transport: Transport, addr: SocketAddr, io_timeout: Duration) -> Self {
        Self {
            id: PeerId::next(),
            addr,
            transport,
            io_timeout,
        }
    }

    pub fn tcp(stream: TcpStream, addr: SocketAddr, io_timeout: Duration) -> Self {
        Self::new(Transport::tcp(stream), addr, io_timeout)
    }

    pub fn id(&self) -> PeerId {
        self.id
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Wait for exactly one `HELLO <identity>` line.
    ///
    /// Anything else (another message, a malformed line, EOF or silence past
    /// the I/O timeout) consumes the connection and returns an error.
    #[instrument(skip(self), fields(peer = %self.id, addr = %self.addr), name = "handshake")]
    pub async fn handshake(mut self) -> Result<PeerConnection, HandshakeError> {
        let outcome = match with_timeout(self.io_timeout, self.transport.read_message()).await {
            Ok(Some(Message::Hello(identity))) => Ok(identity),
            Ok(Some(other)) => Err(PeerError::Unexpected {
                expected: Keyword::Hello,
                got: other.keyword(),
            }),
            Ok(None) => Err(PeerError::Closed),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(identity) => {
                debug!(%identity, "Peer identified");
                Ok(PeerConnection {
                    id: self.id,
                    identity,
                    addr: self.addr,
                    transport: Some(self.transport),
                    io_timeout: self.io_timeout,
                })
            }
            Err(source) => Err(HandshakeError {
                addr: self.addr,
                source,
            }),
        }
    }
}

impl fmt::Display for PendingPeer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Peer[{}@{}]", UNIDENTIFIED, self.addr)
    }
}

/// An identified peer session.
///
/// The session is dropped (closing the socket) the first time an operation
/// fails; from then on every operation returns [`PeerError::Dead`].
pub struct PeerConnection {
    id: PeerId,
    identity: String,
    addr: SocketAddr,
    transport: Option<Transport>,
    io_timeout: Duration,
}

impl PeerConnection {
    pub fn id(&self) -> PeerId {
        self.id
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn state(&self) -> PeerState {
        if self.transport.is_some() {
            PeerState::Identified
        } else {
            PeerState::Dead
        }
    }

    pub fn is_alive(&self) -> bool {
        self.transport.is_some()
    }

    /// Send `TIME_REQUEST <server_time>` and wait for `OFFSET <delta>`.
    ///
    /// Returns the delta exactly as reported. Single-shot: no retry.
    pub async fn request_offset(&mut self, server_time: i64) -> Result<i64, PeerError> {
        let result = self.poll(server_time).await;
        if result.is_err() {
            self.close();
        }
        result
    }

    async fn poll(&mut self, server_time: i64) -> Result<i64, PeerError> {
        let limit = self.io_timeout;
        let transport = self.transport.as_mut().ok_or(PeerError::Dead)?;

        // A reply is only valid after the request it answers.
        if transport.has_pending_input() {
            return Err(PeerError::Unsolicited);
        }
        with_timeout(limit, round_trip(transport, server_time)).await
    }

    /// Push `ADJUST <delta>`. No reply is expected.
    pub async fn send_adjust(&mut self, delta: i64) -> Result<(), PeerError> {
        let result = self.send(Message::Adjust(delta)).await;
        if result.is_err() {
            self.close();
        }
        result
    }

    /// Tell the peer the coordinator is leaving, then close. Best effort.
    pub async fn send_bye(&mut self) {
        if let Err(e) = self.send(Message::Bye).await {
            debug!(peer = %self, error = %e, "BYE not delivered");
        }
        self.close();
    }

    async fn send(&mut self, message: Message) -> Result<(), PeerError> {
        let limit = self.io_timeout;
        let transport = self.transport.as_mut().ok_or(PeerError::Dead)?;
        with_timeout(limit, transport.write_message(message)).await
    }

    /// Drop the session. Safe to call any number of times.
    pub fn close(&mut self) {
        if self.transport.take().is_some() {
            debug!(peer = %self, "Session closed");
        }
    }
}

async fn round_trip(transport: &mut Transport, server_time: i64) -> Result<i64, PeerError> {
    transport
        .write_message(Message::TimeRequest(server_time))
        .await?;
    match transport.read_message().await? {
        Some(Message::Offset(delta)) => Ok(delta),
        Some(other) => Err(PeerError::Unexpected {
            expected: Keyword::Offset,
            got: other.keyword(),
        }),
        None => Err(PeerError::Closed),
    }
}

impl fmt::Debug for PeerConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeerConnection")
            .field("id", &self.id)
            .field("identity", &self.identity)
            .field("addr", &self.addr)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for PeerConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Peer[{}@{}]", self.identity, self.addr)
    }
}
