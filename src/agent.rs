//! Peer agent: the far side of the protocol.
//!
//! Connects to a coordinator, identifies itself, then answers polls against
//! its own [`LogicalClock`] and applies whatever adjustments arrive. Reads are
//! not bounded; the agent waits on the coordinator indefinitely.

use std::net::SocketAddr;
use std::sync::Arc;

use berkeley_proto::{Keyword, Message, Transport};
use tokio::net::TcpStream;
use tracing::{Instrument, debug, info};

use crate::clock::LogicalClock;
use crate::error::PeerError;
use crate::telemetry::spans;

/// Why an agent session ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentExit {
    /// The coordinator said `BYE`.
    Bye,
    /// The coordinator closed the connection.
    Disconnected,
}

pub struct PeerAgent {
    identity: String,
    clock: Arc<LogicalClock>,
}

impl PeerAgent {
    pub fn new(identity: impl Into<String>, clock: Arc<LogicalClock>) -> Self {
        Self {
            identity: identity.into(),
            clock,
        }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn clock(&self) -> &Arc<LogicalClock> {
        &self.clock
    }

    /// Open a TCP session to `addr`.
    pub async fn connect(addr: SocketAddr) -> Result<Transport, PeerError> {
        let stream = TcpStream::connect(addr).await?;
        Ok(Transport::tcp(stream))
    }

    /// Identify and then serve the coordinator until it leaves.
    pub async fn run(&self, transport: Transport) -> Result<AgentExit, PeerError> {
        self.serve(transport)
            .instrument(spans::agent(&self.identity))
            .await
    }

    async fn serve(&self, mut transport: Transport) -> Result<AgentExit, PeerError> {
        transport
            .write_message(Message::Hello(self.identity.clone()))
            .await?;
        info!(time = %self.clock.pretty_now(), offset = self.clock.offset(), "Connected; waiting for requests");

        loop {
            let message = match transport.read_message().await? {
                Some(message) => message,
                None => {
                    info!("Coordinator disconnected");
                    return Ok(AgentExit::Disconnected);
                }
            };

            match message {
                Message::TimeRequest(server_time) => {
                    let delta = self.clock.now().saturating_sub(server_time);
                    debug!(server_time, delta, "Time request answered");
                    transport.write_message(Message::Offset(delta)).await?;
                }
                Message::Adjust(adjustment) => {
                    self.clock.adjust(adjustment);
                    info!(
                        adjustment,
                        time = %self.clock.pretty_now(),
                        offset = self.clock.offset(),
                        "Clock adjusted"
                    );
                }
                Message::Bye => {
                    info!("Coordinator said goodbye");
                    // Closing is best-effort; the session is over either way.
                    let _ = transport.shutdown().await;
                    return Ok(AgentExit::Bye);
                }
                other => {
                    let _ = transport.shutdown().await;
                    return Err(PeerError::Unexpected {
                        expected: Keyword::TimeRequest,
                        got: other.keyword(),
                    });
                }
            }
        }
    }
}
