//! Error types for the synchronization protocol.
//!
//! Everything that can go wrong while framing or parsing a line is a
//! [`ProtocolError`]. I/O failures surface through the same type so that a
//! codec can be driven by `tokio_util::codec::Framed`.

use thiserror::Error;

/// Convenience type alias for Results using [`ProtocolError`].
pub type Result<T, E = ProtocolError> = std::result::Result<T, E>;

/// Top-level protocol errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProtocolError {
    /// I/O error during reading or writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid UTF-8 bytes in a line.
    #[error("invalid UTF-8 in line at byte {byte_pos}: {details}")]
    InvalidUtf8 {
        /// Byte position where UTF-8 validation failed.
        byte_pos: usize,
        /// Detailed error message from the UTF-8 decoder.
        details: String,
    },

    /// Line exceeded the maximum allowed length.
    #[error("line too long: {actual} bytes (limit: {limit})")]
    MessageTooLong {
        /// Actual line length.
        actual: usize,
        /// Maximum allowed length.
        limit: usize,
    },

    /// Control character inside a line.
    #[error("illegal control character: {0:?}")]
    IllegalControlChar(char),

    /// The line carried no keyword at all.
    #[error("empty line")]
    EmptyLine,

    /// The leading keyword is not part of the protocol.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// A keyword that requires an argument arrived without one.
    #[error("{0} requires an argument")]
    MissingArgument(&'static str),

    /// A numeric argument did not parse as a signed 64-bit integer.
    #[error("{command}: invalid number {value:?}")]
    InvalidNumber {
        /// Keyword whose argument failed to parse.
        command: &'static str,
        /// The offending text, already trimmed.
        value: String,
    },

    /// `HELLO` with nothing but whitespace after it.
    #[error("HELLO carries an empty identity")]
    EmptyIdentity,
}
