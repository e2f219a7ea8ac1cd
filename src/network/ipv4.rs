//! IPv4 protocol implementation
//!
//! This module provides IPv4 header parsing, serialization and the checks
//! applied to inbound datagrams.
//!
//! Features:
//! - IPv4 header parsing and serialization
//! - Header checksum calculation and self-check validation
//! - Fragment header construction (shared id, 8-byte offsets, MF flag)
//!
//! Options are neither parsed nor generated, and inbound fragments are not
//! reassembled.

use crate::network::checksum;
use byteorder::{BigEndian, ByteOrder};
use std::net::Ipv4Addr;

pub const IPV4_HEADER_LEN: usize = 20;
const IPV4_VERSION: u8 = 4;
const DEFAULT_IHL: u8 = 5; // 5 * 4 = 20 bytes (standard header length)
pub const DEFAULT_TTL: u8 = 64;

/// Largest datagram accepted or produced (link MTU)
pub const IPV4_MAX_TOTAL_LEN: usize = 1500;

/// Largest payload carried by a single fragment
pub const IPV4_MAX_FRAGMENT_PAYLOAD: usize = IPV4_MAX_TOTAL_LEN - IPV4_HEADER_LEN;

/// Largest payload a fragmented datagram can describe in its 16-bit total length
pub const IPV4_MAX_PAYLOAD: usize = u16::MAX as usize - IPV4_HEADER_LEN;

/// IPv4 packet header structure
///
/// Represents the standard 20-byte IPv4 header as defined in RFC 791
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ipv4Header {
    pub version: u8,
    pub ihl: u8, // Internet Header Length
    pub tos: u8, // Type of Service
    pub total_len: u16,
    pub id: u16,
    pub flags_frag_offset: u16, // Flags and Fragment Offset
    pub ttl: u8,                // Time to Live
    pub protocol: u8,           // Next Protocol
    pub checksum: u16,
    pub src_addr: Ipv4Addr,
    pub dst_addr: Ipv4Addr,
}

impl Ipv4Header {
    /// Create the header of one outbound fragment
    ///
    /// `offset` is measured in 8-byte units. The checksum is left at zero;
    /// call `update_checksum` once all fields are final.
    pub fn fragment(
        total_len: u16,
        id: u16,
        offset: u16,
        more_fragments: bool,
        protocol: u8,
        src_addr: Ipv4Addr,
        dst_addr: Ipv4Addr,
    ) -> Self {
        let mut flags_frag_offset = offset & flags::FRAGMENT_OFFSET_MASK;
        if more_fragments {
            flags_frag_offset |= flags::MORE_FRAGMENTS;
        }

        Ipv4Header {
            version: IPV4_VERSION,
            ihl: DEFAULT_IHL,
            tos: 0,
            total_len,
            id,
            flags_frag_offset,
            ttl: DEFAULT_TTL,
            protocol,
            checksum: 0,
            src_addr,
            dst_addr,
        }
    }

    /// Parse IPv4 header from byte slice
    ///
    /// Returns None if the data is too short to hold a 20-byte header.
    /// Field values are not validated here; see `validate`.
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < IPV4_HEADER_LEN {
            return None;
        }

        Some(Ipv4Header {
            version: (data[0] & 0xF0) >> 4,
            ihl: data[0] & 0x0F,
            tos: data[1],
            total_len: BigEndian::read_u16(&data[2..4]),
            id: BigEndian::read_u16(&data[4..6]),
            flags_frag_offset: BigEndian::read_u16(&data[6..8]),
            ttl: data[8],
            protocol: data[9],
            checksum: BigEndian::read_u16(&data[10..12]),
            src_addr: Ipv4Addr::new(data[12], data[13], data[14], data[15]),
            dst_addr: Ipv4Addr::new(data[16], data[17], data[18], data[19]),
        })
    }

    /// Update checksum after modifying header fields
    pub fn update_checksum(&mut self) {
        self.checksum = 0;
        self.checksum = checksum(&self.to_bytes());
    }

    /// Convert IPv4 header to bytes
    ///
    /// Serializes the header to a 20-byte array ready for transmission
    pub fn to_bytes(&self) -> [u8; IPV4_HEADER_LEN] {
        let mut bytes = [0u8; IPV4_HEADER_LEN];
        bytes[0] = (self.version << 4) | self.ihl;
        bytes[1] = self.tos;
        BigEndian::write_u16(&mut bytes[2..4], self.total_len);
        BigEndian::write_u16(&mut bytes[4..6], self.id);
        BigEndian::write_u16(&mut bytes[6..8], self.flags_frag_offset);
        bytes[8] = self.ttl;
        bytes[9] = self.protocol;
        BigEndian::write_u16(&mut bytes[10..12], self.checksum);
        bytes[12..16].copy_from_slice(&self.src_addr.octets());
        bytes[16..20].copy_from_slice(&self.dst_addr.octets());

        bytes
    }

    /// Get the header length in bytes
    pub fn header_len(&self) -> usize {
        (self.ihl as usize) * 4
    }

    pub fn more_fragments(&self) -> bool {
        self.flags_frag_offset & flags::MORE_FRAGMENTS != 0
    }

    /// Fragment offset in 8-byte units
    pub fn fragment_offset(&self) -> u16 {
        self.flags_frag_offset & flags::FRAGMENT_OFFSET_MASK
    }
}

/// Reasons an inbound datagram is dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ipv4Reject {
    Version,
    HeaderLength,
    ServiceType,
    TotalLength,
    Checksum,
}

impl Ipv4Header {
    /// Validate an inbound header against the raw datagram bytes
    ///
    /// The checksum is verified by summing the whole header, stored
    /// checksum included, which must come out as zero.
    pub fn validate(&self, datagram: &[u8]) -> Result<(), Ipv4Reject> {
        if self.version != IPV4_VERSION {
            return Err(Ipv4Reject::Version);
        }

        let header_len = self.header_len();
        if header_len < IPV4_HEADER_LEN || header_len > datagram.len() {
            return Err(Ipv4Reject::HeaderLength);
        }

        if self.tos & 0x01 != 0 {
            return Err(Ipv4Reject::ServiceType);
        }

        if self.total_len as usize > IPV4_MAX_TOTAL_LEN {
            return Err(Ipv4Reject::TotalLength);
        }

        if checksum(&datagram[..header_len]) != 0 {
            return Err(Ipv4Reject::Checksum);
        }

        Ok(())
    }
}

/// IPv4 protocol constants
pub mod protocol {
    pub const ICMP: u8 = 1;
    pub const UDP: u8 = 17;
}

/// IPv4 flags constants
pub mod flags {
    pub const MORE_FRAGMENTS: u16 = 0x2000;
    pub const FRAGMENT_OFFSET_MASK: u16 = 0x1FFF;
}
