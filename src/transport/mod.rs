//! Transport layer protocols implementation
//!
//! This module contains implementations for transport layer protocols:
//! - UDP: User Datagram Protocol

pub mod udp;

// Re-export commonly used items
pub use udp::{pseudo_checksum, UdpHandler, UdpHeader, UdpTable};
