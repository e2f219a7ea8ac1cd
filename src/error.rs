//! Crate-wide error type
//!
//! Protocol processing never reports malformed input; such frames are
//! dropped. `Error` only covers buffer misuse, oversize sends, handler
//! registration, configuration parsing and device I/O.

use std::io;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Not enough headroom in front of the buffer window for a new header
    #[error("not enough headroom to prepend {0} bytes")]
    NoHeadroom(usize),
    /// Attempt to strip more bytes than the buffer holds
    #[error("cannot remove {0} bytes from the buffer")]
    Underflow(usize),
    /// Outbound payload does not fit the length fields of one datagram
    #[error("payload of {0} bytes is too large to send")]
    PayloadTooLarge(usize),
    /// The UDP handler table has no free slot for a new port
    #[error("udp handler table is full")]
    TableFull,
    #[error("invalid hardware address: {0}")]
    InvalidMac(String),
    #[error("device i/o: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
