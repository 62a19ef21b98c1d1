//! Message codec for tokio.
//!
//! Wraps [`LineCodec`] and parses each line into a [`Message`].

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::error::{ProtocolError, Result};
use crate::line::LineCodec;
use crate::message::Message;

/// Tokio codec for encoding/decoding synchronization [`Message`]s.
#[derive(Default)]
pub struct SyncCodec {
    inner: LineCodec,
}

impl SyncCodec {
    /// Create a codec with the default line limit.
    pub fn new() -> Self {
        Self {
            inner: LineCodec::new(),
        }
    }

    /// Sanitize outgoing line data.
    ///
    /// A serialized message must fit on one line: control characters,
    /// line breaks included, are rejected.
    pub fn sanitize(data: String) -> Result<String> {
        match data.chars().find(|ch| ch.is_control()) {
            Some(ch) => Err(ProtocolError::IllegalControlChar(ch)),
            None => Ok(data),
        }
    }
}

impl Decoder for SyncCodec {
    type Item = Message;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Message>> {
        self.inner
            .decode(src)
            .and_then(|res| res.map_or(Ok(None), |line| line.parse::<Message>().map(Some)))
    }
}

impl Encoder<Message> for SyncCodec {
    type Error = ProtocolError;

    fn encode(&mut self, msg: Message, dst: &mut BytesMut) -> Result<()> {
        let sanitized = Self::sanitize(msg.to_string())?;
        self.inner.encode(sanitized, dst)
    }
}
