//! Test peer.
//!
//! Speaks the line protocol directly over TCP so tests control every reply,
//! including the wrong ones.

use berkeley_proto::Message;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::time::timeout;

/// A hand-driven peer connection.
pub struct TestPeer {
    reader: BufReader<OwnedReadHalf>,
    writer: BufWriter<OwnedWriteHalf>,
}

impl TestPeer {
    /// Connect without saying anything.
    pub async fn connect(addr: SocketAddr) -> anyhow::Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        let (read_half, write_half) = stream.into_split();

        Ok(Self {
            reader: BufReader::new(read_half),
            writer: BufWriter::new(write_half),
        })
    }

    /// Connect and identify.
    pub async fn hello(addr: SocketAddr, identity: &str) -> anyhow::Result<Self> {
        let mut peer = Self::connect(addr).await?;
        peer.send_raw(&format!("HELLO {identity}")).await?;
        Ok(peer)
    }

    /// Send one raw line; a newline is appended when missing.
    pub async fn send_raw(&mut self, line: &str) -> anyhow::Result<()> {
        self.writer.write_all(line.as_bytes()).await?;
        if !line.ends_with('\n') {
            self.writer.write_all(b"\n").await?;
        }
        self.writer.flush().await?;
        Ok(())
    }

    /// Receive one line, or `None` once the coordinator has closed the
    /// connection.
    pub async fn recv_line(&mut self) -> anyhow::Result<Option<String>> {
        let mut line = String::new();
        let read = timeout(Duration::from_secs(5), self.reader.read_line(&mut line)).await??;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end().to_string()))
    }

    /// Receive and parse one message.
    pub async fn recv(&mut self) -> anyhow::Result<Message> {
        match self.recv_line().await? {
            Some(line) => line
                .parse::<Message>()
                .map_err(|e| anyhow::anyhow!("Parse error: {}", e)),
            None => anyhow::bail!("connection closed"),
        }
    }

    /// Expect a `TIME_REQUEST` and return the coordinator time it carries.
    pub async fn expect_time_request(&mut self) -> anyhow::Result<i64> {
        match self.recv().await? {
            Message::TimeRequest(t) => Ok(t),
            other => anyhow::bail!("expected TIME_REQUEST, got {other}"),
        }
    }

    /// Expect an `ADJUST` and return its delta.
    pub async fn expect_adjust(&mut self) -> anyhow::Result<i64> {
        match self.recv().await? {
            Message::Adjust(d) => Ok(d),
            other => anyhow::bail!("expected ADJUST, got {other}"),
        }
    }

    /// Answer the next poll with a fixed delta.
    pub async fn answer(&mut self, delta: i64) -> anyhow::Result<()> {
        self.expect_time_request().await?;
        self.send_raw(&format!("OFFSET {delta}")).await
    }

    /// Expect the coordinator to close the connection.
    pub async fn expect_closed(&mut self) -> anyhow::Result<()> {
        match self.recv_line().await {
            Ok(None) => Ok(()),
            // A reset counts as closed.
            Err(e) if e.downcast_ref::<std::io::Error>().is_some() => Ok(()),
            Ok(Some(line)) => anyhow::bail!("expected close, got {line:?}"),
            Err(e) => Err(e),
        }
    }
}
