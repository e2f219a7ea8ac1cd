//! ICMP (Internet Control Message Protocol) implementation
//!
//! This module provides ICMP header parsing and the two messages the stack
//! generates: Echo Reply and Destination Unreachable.

use crate::network::checksum;
use crate::network::ipv4::IPV4_HEADER_LEN;
use byteorder::{BigEndian, ByteOrder};

/// Minimum ICMP header length in bytes
pub const ICMP_HEADER_LEN: usize = 8;

/// Bytes of the offending datagram quoted in an error message
pub const ICMP_ERROR_QUOTE_LEN: usize = IPV4_HEADER_LEN + 8;

/// ICMP message types
pub const ICMP_TYPE_ECHO_REPLY: u8 = 0;
pub const ICMP_TYPE_DEST_UNREACHABLE: u8 = 3;
pub const ICMP_TYPE_ECHO_REQUEST: u8 = 8;

/// Destination Unreachable codes
pub mod code {
    pub const PROTOCOL_UNREACHABLE: u8 = 2;
    pub const PORT_UNREACHABLE: u8 = 3;
}

/// ICMP packet header structure
///
/// Represents the standard 8-byte ICMP header as defined in RFC 792
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IcmpHeader {
    pub msg_type: u8,  // ICMP message type
    pub msg_code: u8,  // ICMP message code
    pub checksum: u16, // ICMP checksum
    pub rest: [u8; 4], // Type-specific data (e.g., identifier and sequence for echo)
}

impl IcmpHeader {
    /// Parse ICMP header from byte slice
    ///
    /// Returns None if the data is too short to contain a valid ICMP header
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < ICMP_HEADER_LEN {
            return None;
        }

        Some(IcmpHeader {
            msg_type: data[0],
            msg_code: data[1],
            checksum: BigEndian::read_u16(&data[2..4]),
            rest: [data[4], data[5], data[6], data[7]],
        })
    }

    /// Convert ICMP header to bytes
    pub fn to_bytes(&self) -> [u8; ICMP_HEADER_LEN] {
        let mut bytes = [0u8; ICMP_HEADER_LEN];
        bytes[0] = self.msg_type;
        bytes[1] = self.msg_code;
        BigEndian::write_u16(&mut bytes[2..4], self.checksum);
        bytes[4..8].copy_from_slice(&self.rest);
        bytes
    }

    /// Check if this is an Echo Request message
    pub fn is_echo_request(&self) -> bool {
        self.msg_type == ICMP_TYPE_ECHO_REQUEST && self.msg_code == 0
    }

    /// Get the identifier field for Echo Request/Reply messages
    pub fn identifier(&self) -> u16 {
        BigEndian::read_u16(&self.rest[0..2])
    }

    /// Get the sequence number field for Echo Request/Reply messages
    pub fn sequence(&self) -> u16 {
        BigEndian::read_u16(&self.rest[2..4])
    }
}

/// Build an Echo Reply answering `request`
///
/// Identifier, sequence and payload are copied verbatim; the checksum
/// covers the whole reply.
pub fn echo_reply(request: &[u8]) -> Option<Vec<u8>> {
    let header = IcmpHeader::from_bytes(request)?;
    let reply_header = IcmpHeader {
        msg_type: ICMP_TYPE_ECHO_REPLY,
        msg_code: 0,
        checksum: 0,
        rest: header.rest,
    };

    let mut reply = Vec::with_capacity(request.len());
    reply.extend_from_slice(&reply_header.to_bytes());
    reply.extend_from_slice(&request[ICMP_HEADER_LEN..]);
    seal(&mut reply);
    Some(reply)
}

/// Build a Destination Unreachable message quoting `datagram`
///
/// The quote is the first 28 bytes of the offending datagram (its IP header
/// plus 8 payload bytes), zero-padded if the datagram is shorter.
pub fn dest_unreachable(datagram: &[u8], unreachable_code: u8) -> Vec<u8> {
    let header = IcmpHeader {
        msg_type: ICMP_TYPE_DEST_UNREACHABLE,
        msg_code: unreachable_code,
        checksum: 0,
        rest: [0; 4],
    };

    let mut msg = vec![0u8; ICMP_HEADER_LEN + ICMP_ERROR_QUOTE_LEN];
    msg[..ICMP_HEADER_LEN].copy_from_slice(&header.to_bytes());
    let quoted = datagram.len().min(ICMP_ERROR_QUOTE_LEN);
    msg[ICMP_HEADER_LEN..ICMP_HEADER_LEN + quoted].copy_from_slice(&datagram[..quoted]);
    seal(&mut msg);
    msg
}

fn seal(msg: &mut [u8]) {
    msg[2..4].copy_from_slice(&[0, 0]);
    let sum = checksum(msg);
    BigEndian::write_u16(&mut msg[2..4], sum);
}
