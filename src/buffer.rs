//! Packet buffer with a movable start offset
//!
//! Protocol layers add and strip headers by moving the start of the window
//! instead of copying the payload. Bytes that fall outside the window are
//! left alone, so a stripped header can be put back byte for byte.

use crate::error::{Error, Result};

/// Bytes reserved in front of every fresh buffer for lower-layer headers
/// (UDP pseudo-header + UDP + IPv4 + Ethernet fits with room to spare).
pub const DEFAULT_HEADROOM: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketBuffer {
    storage: Vec<u8>,
    start: usize,
    len: usize,
}

impl PacketBuffer {
    /// Create a buffer holding `len` zeroed bytes
    pub fn new(len: usize) -> Self {
        PacketBuffer {
            storage: vec![0u8; DEFAULT_HEADROOM + len],
            start: DEFAULT_HEADROOM,
            len,
        }
    }

    /// Create a buffer holding a copy of `data`
    pub fn from_slice(data: &[u8]) -> Self {
        let mut storage = Vec::with_capacity(DEFAULT_HEADROOM + data.len());
        storage.resize(DEFAULT_HEADROOM, 0);
        storage.extend_from_slice(data);
        PacketBuffer {
            storage,
            start: DEFAULT_HEADROOM,
            len: data.len(),
        }
    }

    /// Grow the window backwards by `n` bytes
    pub fn add_header(&mut self, n: usize) -> Result<()> {
        if n > self.start {
            return Err(Error::NoHeadroom(n));
        }
        self.start -= n;
        self.len += n;
        Ok(())
    }

    /// Shrink the window from the front by `n` bytes
    pub fn remove_header(&mut self, n: usize) -> Result<()> {
        if n > self.len {
            return Err(Error::Underflow(n));
        }
        self.start += n;
        self.len -= n;
        Ok(())
    }

    /// Shorten the logical length. Never grows the window.
    pub fn truncate(&mut self, len: usize) {
        self.len = self.len.min(len);
    }

    pub fn data(&self) -> &[u8] {
        &self.storage[self.start..self.start + self.len]
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.storage[self.start..self.start + self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
