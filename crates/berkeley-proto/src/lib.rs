//! # berkeley-proto
//!
//! Wire protocol spoken between a Berkeley time coordinator and its peers.
//!
//! Every message is a single UTF-8 line terminated by `\n`:
//!
//! | Direction            | Line                          |
//! |----------------------|-------------------------------|
//! | peer → coordinator   | `HELLO <identity>`            |
//! | coordinator → peer   | `TIME_REQUEST <serverMillis>` |
//! | peer → coordinator   | `OFFSET <deltaMillis>`        |
//! | coordinator → peer   | `ADJUST <deltaMillis>`        |
//! | coordinator → peer   | `BYE`                         |
//!
//! ## Quick Start
//!
//! ```rust
//! use berkeley_proto::Message;
//!
//! let poll = Message::TimeRequest(1_000);
//! assert_eq!(poll.to_string(), "TIME_REQUEST 1000");
//!
//! let reply: Message = "OFFSET -500".parse().expect("valid line");
//! assert_eq!(reply, Message::Offset(-500));
//! ```
//!
//! With the default `tokio` feature the crate also provides [`LineCodec`],
//! [`SyncCodec`] and [`Transport`] for framed async I/O.

#![deny(clippy::all)]
#![warn(missing_docs)]

#[cfg(feature = "tokio")]
pub mod codec;
pub mod error;
#[cfg(feature = "tokio")]
pub mod line;
pub mod message;
#[cfg(feature = "tokio")]
pub mod transport;

#[cfg(feature = "tokio")]
pub use self::codec::SyncCodec;
pub use self::error::{ProtocolError, Result};
#[cfg(feature = "tokio")]
pub use self::line::LineCodec;
pub use self::message::{Keyword, Message};
#[cfg(feature = "tokio")]
pub use self::transport::{SessionStream, Transport};

/// Maximum length of a single protocol line in bytes, terminator included.
pub const MAX_LINE_LEN: usize = 512;
