//! Framed message transport over any async byte stream.
//!
//! [`Transport`] owns a session exclusively. TCP sockets are the production
//! stream; tests drive the same code over `tokio::io::duplex` pipes.

use futures_util::{FutureExt, SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;
use tracing::warn;

use crate::codec::SyncCodec;
use crate::error::Result;
use crate::message::Message;

/// Byte stream a [`Transport`] can run over.
pub trait SessionStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> SessionStream for T {}

/// Line-framed protocol transport.
pub struct Transport {
    framed: Framed<Box<dyn SessionStream>, SyncCodec>,
}

impl Transport {
    /// Wrap an arbitrary stream.
    pub fn new<S: SessionStream + 'static>(stream: S) -> Self {
        Self {
            framed: Framed::new(Box::new(stream), SyncCodec::new()),
        }
    }

    /// Create a new TCP transport from a connected stream.
    ///
    /// Keepalive is enabled on a best-effort basis; failing to set it only
    /// logs a warning.
    pub fn tcp(stream: TcpStream) -> Self {
        if let Err(e) = Self::enable_keepalive(&stream) {
            warn!("failed to enable TCP keepalive: {}", e);
        }
        if let Err(e) = stream.set_nodelay(true) {
            warn!("failed to set TCP_NODELAY: {}", e);
        }
        Self::new(stream)
    }

    fn enable_keepalive(stream: &TcpStream) -> std::io::Result<()> {
        use socket2::{SockRef, TcpKeepalive};
        use std::time::Duration;

        let sock = SockRef::from(stream);
        let keepalive = TcpKeepalive::new()
            .with_time(Duration::from_secs(120))
            .with_interval(Duration::from_secs(30));

        sock.set_tcp_keepalive(&keepalive)
    }

    /// Read the next message.
    ///
    /// Returns `Ok(None)` once the remote side has closed the stream.
    pub async fn read_message(&mut self) -> Result<Option<Message>> {
        match self.framed.next().await {
            Some(Ok(msg)) => Ok(Some(msg)),
            Some(Err(e)) => Err(e),
            None => Ok(None),
        }
    }

    /// Whether the remote has sent anything not yet read.
    ///
    /// Looks at the frame buffer, then polls the stream once without waiting.
    /// A complete message found this way is discarded.
    pub fn has_pending_input(&mut self) -> bool {
        match self.framed.next().now_or_never() {
            Some(Some(_)) => true,
            Some(None) => false,
            None => !self.framed.read_buffer().is_empty(),
        }
    }

    /// Write one message and flush it.
    pub async fn write_message(&mut self, message: Message) -> Result<()> {
        self.framed.send(message).await
    }

    /// Shut down the write half of the underlying stream.
    pub async fn shutdown(&mut self) -> Result<()> {
        self.framed.get_mut().shutdown().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

    #[tokio::test]
    async fn test_write_then_read_over_duplex() {
        let (near, far) = tokio::io::duplex(256);
        let mut coordinator = Transport::new(near);
        let mut peer = Transport::new(far);

        coordinator
            .write_message(Message::TimeRequest(1000))
            .await
            .unwrap();
        assert_eq!(
            peer.read_message().await.unwrap(),
            Some(Message::TimeRequest(1000))
        );

        peer.write_message(Message::Offset(-500)).await.unwrap();
        assert_eq!(
            coordinator.read_message().await.unwrap(),
            Some(Message::Offset(-500))
        );
    }

    #[tokio::test]
    async fn test_read_returns_none_on_eof() {
        let (near, far) = tokio::io::duplex(64);
        let mut transport = Transport::new(near);
        drop(far);

        assert!(transport.read_message().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_lines_on_the_wire() {
        let (near, far) = tokio::io::duplex(64);
        let mut transport = Transport::new(near);
        transport.write_message(Message::Adjust(133)).await.unwrap();
        transport.shutdown().await.unwrap();

        let mut reader = BufReader::new(far);
        let mut line = String::new();
        reader.read_line(&mut line).await.unwrap();
        assert_eq!(line, "ADJUST 133\n");
    }

    #[tokio::test]
    async fn test_pending_input_sees_unread_lines() {
        let (near, mut far) = tokio::io::duplex(64);
        let mut transport = Transport::new(near);
        assert!(!transport.has_pending_input());

        far.write_all(b"HELLO a\nOFFSET 9000\n").await.unwrap();
        assert_eq!(
            transport.read_message().await.unwrap(),
            Some(Message::Hello("a".into()))
        );
        assert!(transport.has_pending_input());
    }

    #[tokio::test]
    async fn test_pending_input_sees_partial_line() {
        let (near, mut far) = tokio::io::duplex(64);
        let mut transport = Transport::new(near);

        far.write_all(b"OFF").await.unwrap();
        assert!(transport.has_pending_input());
    }

    #[tokio::test]
    async fn test_no_pending_input_after_close() {
        let (near, far) = tokio::io::duplex(64);
        let mut transport = Transport::new(near);
        drop(far);

        assert!(!transport.has_pending_input());
    }
}
