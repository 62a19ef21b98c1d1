//! Gateway - TCP listener that accepts incoming peer connections.
//!
//! The Gateway binds the listen socket and spawns a handshake task for each
//! incoming connection. Only peers that complete the handshake are handed to
//! the [`Coordinator`].

use crate::coordinator::Coordinator;
use crate::network::PendingPeer;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info, instrument, warn};

/// The Gateway accepts incoming TCP connections and registers identified peers.
pub struct Gateway {
    listener: TcpListener,
    coordinator: Arc<Coordinator>,
    io_timeout: Duration,
}

impl Gateway {
    /// Bind the gateway to the specified address.
    pub async fn bind(
        addr: SocketAddr,
        coordinator: Arc<Coordinator>,
        io_timeout: Duration,
    ) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        info!(addr = %listener.local_addr()?, "Listener bound");

        Ok(Self {
            listener,
            coordinator,
            io_timeout,
        })
    }

    /// Address actually bound (resolves port 0).
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Run the gateway, accepting connections forever.
    #[instrument(skip(self), name = "gateway")]
    pub async fn run(self) -> anyhow::Result<()> {
        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    info!(%addr, "Connection accepted");

                    let pending = PendingPeer::tcp(stream, addr, self.io_timeout);
                    let coordinator = Arc::clone(&self.coordinator);

                    tokio::spawn(async move {
                        match pending.handshake().await {
                            Ok(conn) => {
                                coordinator.register(conn);
                            }
                            Err(e) => {
                                warn!(
                                    %addr,
                                    error = %e,
                                    kind = ?e.source.kind(),
                                    code = e.source.error_code(),
                                    "Handshake failed; connection dropped"
                                );
                            }
                        }
                    });
                }
                Err(e) => {
                    error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }
}
