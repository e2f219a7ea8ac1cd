//! UDP (User Datagram Protocol) implementation
//!
//! This module provides UDP header parsing, the pseudo-header checksum and
//! the port to handler registration table.

use crate::buffer::PacketBuffer;
use crate::error::{Error, Result};
use crate::network::checksum;
use crate::network::ipv4::protocol;
use byteorder::{BigEndian, ByteOrder};
use std::fmt;
use std::net::Ipv4Addr;

/// UDP header length in bytes
pub const UDP_HEADER_LEN: usize = 8;

/// IPv4 pseudo-header length: src(4) + dst(4) + zero(1) + protocol(1) + length(2)
pub const PSEUDO_HEADER_LEN: usize = 12;

/// UDP packet header structure
///
/// Represents the standard 8-byte UDP header as defined in RFC 768
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UdpHeader {
    pub src_port: u16,
    pub dst_port: u16,
    pub length: u16, // Length of UDP header and data
    pub checksum: u16,
}

impl UdpHeader {
    /// Parse UDP header from byte slice
    ///
    /// Returns None if the data is too short to contain a valid UDP header
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < UDP_HEADER_LEN {
            return None;
        }

        Some(UdpHeader {
            src_port: BigEndian::read_u16(&data[0..2]),
            dst_port: BigEndian::read_u16(&data[2..4]),
            length: BigEndian::read_u16(&data[4..6]),
            checksum: BigEndian::read_u16(&data[6..8]),
        })
    }

    /// Convert UDP header to bytes
    pub fn to_bytes(&self) -> [u8; UDP_HEADER_LEN] {
        let mut bytes = [0u8; UDP_HEADER_LEN];
        BigEndian::write_u16(&mut bytes[0..2], self.src_port);
        BigEndian::write_u16(&mut bytes[2..4], self.dst_port);
        BigEndian::write_u16(&mut bytes[4..6], self.length);
        BigEndian::write_u16(&mut bytes[6..8], self.checksum);
        bytes
    }
}

/// Calculate the UDP checksum of `buf` with an IPv4 pseudo-header
///
/// `buf` must start with a UDP header. The pseudo-header is written into the
/// headroom in front of it and removed again; the 12 bytes it covered are
/// restored, so the buffer is unchanged when this returns.
pub fn pseudo_checksum(buf: &mut PacketBuffer, src_ip: Ipv4Addr, dst_ip: Ipv4Addr) -> Result<u16> {
    if buf.len() < UDP_HEADER_LEN {
        return Err(Error::Underflow(UDP_HEADER_LEN));
    }
    buf.add_header(PSEUDO_HEADER_LEN)?;

    let data = buf.data_mut();
    let mut saved = [0u8; PSEUDO_HEADER_LEN];
    saved.copy_from_slice(&data[..PSEUDO_HEADER_LEN]);

    data[0..4].copy_from_slice(&src_ip.octets());
    data[4..8].copy_from_slice(&dst_ip.octets());
    data[8] = 0;
    data[9] = protocol::UDP;
    // Length comes from the UDP header already in place
    let length = BigEndian::read_u16(&data[PSEUDO_HEADER_LEN + 4..PSEUDO_HEADER_LEN + 6]);
    BigEndian::write_u16(&mut data[10..12], length);

    let sum = checksum(data);

    data[..PSEUDO_HEADER_LEN].copy_from_slice(&saved);
    buf.remove_header(PSEUDO_HEADER_LEN)?;
    Ok(sum)
}

/// Callback invoked with (source address, source port, payload)
pub type UdpHandler = Box<dyn FnMut(Ipv4Addr, u16, &[u8])>;

struct UdpEntry {
    port: u16,
    handler: UdpHandler,
}

/// Fixed-capacity port to handler table
pub struct UdpTable {
    slots: Vec<Option<UdpEntry>>,
}

impl UdpTable {
    pub fn new(capacity: usize) -> Self {
        UdpTable {
            slots: (0..capacity).map(|_| None).collect(),
        }
    }

    /// Register `handler` for `port`
    ///
    /// An existing registration for the port is replaced. Fails without
    /// touching the table if the port is new and no slot is free.
    pub fn open(&mut self, port: u16, handler: UdpHandler) -> Result<()> {
        if let Some(entry) = self.slots.iter_mut().flatten().find(|e| e.port == port) {
            entry.handler = handler;
            return Ok(());
        }

        let slot = self
            .slots
            .iter_mut()
            .find(|s| s.is_none())
            .ok_or(Error::TableFull)?;
        *slot = Some(UdpEntry { port, handler });
        Ok(())
    }

    pub fn close(&mut self, port: u16) {
        for slot in self.slots.iter_mut() {
            if matches!(slot, Some(e) if e.port == port) {
                *slot = None;
            }
        }
    }

    pub fn handler_mut(&mut self, port: u16) -> Option<&mut UdpHandler> {
        self.slots
            .iter_mut()
            .flatten()
            .find(|e| e.port == port)
            .map(|e| &mut e.handler)
    }

    pub fn is_open(&self, port: u16) -> bool {
        self.slots.iter().flatten().any(|e| e.port == port)
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}

impl fmt::Debug for UdpTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ports: Vec<u16> = self.slots.iter().flatten().map(|e| e.port).collect();
        f.debug_struct("UdpTable")
            .field("ports", &ports)
            .field("capacity", &self.slots.len())
            .finish()
    }
}
